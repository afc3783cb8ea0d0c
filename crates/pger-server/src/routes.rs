//! Router configuration module

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::download;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory archives are served from.
    pub packages_dir: Arc<PathBuf>,
}

/// Create the application router serving archives from `packages_dir`.
pub fn create_router(packages_dir: impl Into<PathBuf>) -> Router {
    let state = AppState {
        packages_dir: Arc::new(packages_dir.into()),
    };

    Router::new()
        .route("/download/{package}", get(download))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
