//! Bookstand storefront API server.
//!
//! Serves the bookstore catalog through the read-through cache layer:
//! category listings, per-category book lists, batch book and image lookups,
//! vector-backed search, the aggregate snapshot and its population trigger,
//! an events feed and cache administration.
//!
//! # Architecture
//!
//! The server uses a library-first design:
//! - `server`: shared state construction and orchestration
//! - `config`: configuration loading and validation
//! - `http`: axum router and handlers
//!
//! # Example
//!
//! ```no_run
//! use bookstand_api::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = ServerConfig::from_args();
//!     config.validate()?;
//!
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod http;
pub mod server;

pub use config::ServerConfig;
pub use error::{ConfigError, ServerError};
pub use server::{AppState, Server};
