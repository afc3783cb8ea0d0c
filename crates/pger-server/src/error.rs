//! API error handling module
//!
//! Errors are returned as plain text, matching what download clients expect.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors returned by the download endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No archive with the requested name.
    #[error("Package not found")]
    NotFound,

    /// The archive exists but could not be read.
    #[error("Failed to read package: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Io(e) = &self {
            tracing::error!("Download failed: {e}");
        }
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
