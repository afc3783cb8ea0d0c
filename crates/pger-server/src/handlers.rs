//! Request handlers.

use std::io::ErrorKind;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use pger_schema::is_plain_file_name;
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::routes::AppState;

/// GET /download/{package} - stream an archive as an attachment
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] (404, plain text) when the name is not a
/// plain file name or no such archive exists, and [`ApiError::Io`] when the
/// archive cannot be read.
pub async fn download(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&package) {
        tracing::debug!("Rejected download name {package:?}");
        return Err(ApiError::NotFound);
    }

    let path = state.packages_dir.join(&package);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => return Err(e.into()),
    };
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(ApiError::NotFound);
    }

    tracing::info!("Serving {} ({} bytes)", path.display(), metadata.len());

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{package}\""))
        .map_err(|_| ApiError::NotFound)?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
        (header::CONTENT_LENGTH, HeaderValue::from(metadata.len())),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

