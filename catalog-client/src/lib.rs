//! HTTP client for the upstream bookstore catalog provider
//!
//! All outbound calls carry a bearer token and a fixed `Catalog-Version`
//! header, and go through a bounded exponential-backoff retry loop that is
//! aware of HTTP 429 rate limiting.

mod error;
mod http;
mod models;
pub mod wire;

pub use error::{Error, Result};
pub use http::{CatalogClient, CatalogClientBuilder, MAX_BATCH_OBJECTS};
pub use models::{Book, Category, ImageRef};
