//! pger download server - read-only HTTP access to a repository's archives
//!
//! Exposes a single endpoint:
//! - `GET /download/{package}` - stream `packages/{package}` as an attachment
//!
//! The server never writes to the repository, so any number of requests may
//! run concurrently with each other and with a publisher.
//!
//! The library holds the router so integration tests can drive it without a
//! socket; the binary only adds configuration and the listener.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, create_router};
