//! Server configuration from flags and environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use pger_core::{DEFAULT_REPOSITORY_ROOT, REPOSITORY_ENV, RepositoryLayout};

/// Environment variable overriding the bind address.
pub const BIND_ENV: &str = "PGER_BIND";

/// Bind address used when nothing else is configured.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "pger-server", version, about = "Serve pger package archives over HTTP")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = BIND_ENV, default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Repository root; archives are served from its packages/ directory
    #[arg(long, env = REPOSITORY_ENV, default_value = DEFAULT_REPOSITORY_ROOT)]
    pub repository: PathBuf,
}

impl ServerConfig {
    /// Directory archives are served from.
    pub fn packages_dir(&self) -> PathBuf {
        RepositoryLayout::new(&self.repository).packages_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_all_interfaces_on_8080() {
        let config = ServerConfig::try_parse_from(["pger-server", "--repository", "/srv/repo"])
            .unwrap();
        // PGER_BIND may be set in the environment running the tests.
        if std::env::var(BIND_ENV).is_err() {
            assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        }
        assert_eq!(config.packages_dir(), PathBuf::from("/srv/repo/packages"));
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "pger-server",
            "--bind",
            "127.0.0.1:9000",
            "--repository",
            "/tmp/r",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.repository, PathBuf::from("/tmp/r"));
    }
}
