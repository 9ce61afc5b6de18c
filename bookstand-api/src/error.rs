//! Error types for the storefront server.

use std::net::SocketAddr;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required configuration value
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Malformed fallback category entry
    #[error("Invalid fallback category '{entry}': expected 'id:name'")]
    InvalidFallbackCategory {
        /// The entry that failed to parse
        entry: String,
    },
}

/// Server startup and runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the HTTP listener
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    BindFailed {
        /// Address that failed to bind
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog client construction failed
    #[error("Catalog client error: {0}")]
    Catalog(#[from] catalog_client::Error),

    /// Cache store construction failed
    #[error("Cache store error: {0}")]
    Kv(#[from] bookstand_cache::KvError),

    /// Search client construction failed
    #[error("Search client error: {0}")]
    Search(#[from] vector_client::Error),

    /// Events client construction failed
    #[error("Events client error: {0}")]
    Events(#[from] events_client::Error),

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::MissingRequired("catalog access token".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: catalog access token"
        );

        let err = ConfigError::InvalidFallbackCategory {
            entry: "no-name".to_string(),
        };
        assert!(err.to_string().contains("expected 'id:name'"));
    }

    #[test]
    fn test_server_error_conversion() {
        let cfg = ConfigError::MissingRequired("bind".to_string());
        let server_err: ServerError = cfg.into();
        assert!(server_err.to_string().contains("Configuration error"));
    }
}
