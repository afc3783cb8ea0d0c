//! pger download server
//!
//! Serves `GET /download/{package}` from the repository's packages directory.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pger_server::{ServerConfig, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = ServerConfig::parse();
    let packages_dir = config.packages_dir();

    tokio::fs::create_dir_all(&packages_dir)
        .await
        .with_context(|| format!("Failed to create {}", packages_dir.display()))?;

    tracing::info!("Packages directory: {}", packages_dir.display());
    tracing::info!("Listening on {}", config.bind);
    tracing::info!("Usage: http://<host>:{}/download/<name>-<version>.pger", config.bind.port());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    axum::serve(listener, create_router(packages_dir))
        .await
        .context("Server error")?;
    Ok(())
}
