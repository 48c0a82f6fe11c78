//! Server Configuration
//!
//! Bind address and dataset locations. Defaults match the service's fixed
//! values: `127.0.0.1:3001`, `movies.csv` and `ratings.csv` in the working
//! directory.

use crate::schema::{MOVIES, RATINGS};
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    pub host: String,

    /// Port to bind to (default: 3001)
    pub port: u16,

    pub movies_path: PathBuf,

    pub ratings_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            movies_path: PathBuf::from(MOVIES.source_file),
            ratings_path: PathBuf::from(RATINGS.source_file),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr(), "127.0.0.1:3001");
        assert_eq!(config.movies_path, PathBuf::from("movies.csv"));
        assert_eq!(config.ratings_path, PathBuf::from("ratings.csv"));
    }

    #[test]
    fn test_socket_addr_override() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }
}
