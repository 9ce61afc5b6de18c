//! Server configuration management.
//!
//! Configuration is loaded from CLI arguments and `BOOKSTAND_*` environment
//! variables. Optional integrations (remote cache store, vector search,
//! events feed) activate only when their credentials are present; the server
//! degrades to an in-memory cache, no search and the static events fallback
//! otherwise.

use clap::Parser;
use std::net::SocketAddr;

use catalog_client::Category;

use crate::error::ConfigError;

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bookstand-api",
    about = "Cached bookstore storefront API",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "BOOKSTAND_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Upstream catalog API base URL
    #[arg(
        long,
        env = "BOOKSTAND_CATALOG_URL",
        default_value = "https://connect.catalog-provider.com"
    )]
    pub catalog_url: String,

    /// Upstream catalog access token
    #[arg(long, env = "BOOKSTAND_CATALOG_TOKEN")]
    pub catalog_token: Option<String>,

    /// Remote KV cache store base URL (in-memory cache when unset)
    #[arg(long, env = "BOOKSTAND_KV_URL")]
    pub kv_url: Option<String>,

    /// Remote KV cache store token
    #[arg(long, env = "BOOKSTAND_KV_TOKEN")]
    pub kv_token: Option<String>,

    /// Vector search provider base URL (search disabled when unset)
    #[arg(long, env = "BOOKSTAND_VECTOR_URL")]
    pub vector_url: Option<String>,

    /// Vector search provider API key
    #[arg(long, env = "BOOKSTAND_VECTOR_API_KEY")]
    pub vector_api_key: Option<String>,

    /// Vector search namespace
    #[arg(long, env = "BOOKSTAND_VECTOR_NAMESPACE", default_value = "books")]
    pub vector_namespace: String,

    /// Events spreadsheet API base URL
    #[arg(
        long,
        env = "BOOKSTAND_EVENTS_URL",
        default_value = "https://sheets.googleapis.com"
    )]
    pub events_url: String,

    /// Events spreadsheet API key (events feed disabled when unset)
    #[arg(long, env = "BOOKSTAND_EVENTS_API_KEY")]
    pub events_api_key: Option<String>,

    /// Events spreadsheet identifier
    #[arg(long, env = "BOOKSTAND_EVENTS_SHEET_ID")]
    pub events_sheet_id: Option<String>,

    /// Events spreadsheet range
    #[arg(long, env = "BOOKSTAND_EVENTS_RANGE", default_value = "Events!A:E")]
    pub events_range: String,

    /// Category identifiers populated into the snapshot, comma-separated
    #[arg(long, env = "BOOKSTAND_CATEGORY_IDS", default_value = "")]
    pub category_ids: String,

    /// Fallback categories served on a snapshot miss, as comma-separated
    /// `id:name` pairs
    #[arg(long, env = "BOOKSTAND_FALLBACK_CATEGORIES", default_value = "")]
    pub fallback_categories: String,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Snapshot population category identifiers.
    #[must_use]
    pub fn category_id_list(&self) -> Vec<String> {
        self.category_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Parse the fallback category pairs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFallbackCategory` for an entry without a
    /// `:` separator or with an empty id or name.
    pub fn fallback_category_list(&self) -> Result<Vec<Category>, ConfigError> {
        self.fallback_categories
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| {
                let (id, name) = entry
                    .split_once(':')
                    .filter(|(id, name)| !id.trim().is_empty() && !name.trim().is_empty())
                    .ok_or_else(|| ConfigError::InvalidFallbackCategory {
                        entry: entry.to_string(),
                    })?;
                Ok(Category {
                    id: id.trim().to_string(),
                    name: name.trim().to_string(),
                })
            })
            .collect()
    }

    /// Check whether the remote KV store is configured.
    #[must_use]
    pub fn has_remote_kv(&self) -> bool {
        self.kv_url.is_some() && self.kv_token.is_some()
    }

    /// Check whether vector search is configured.
    #[must_use]
    pub fn has_search(&self) -> bool {
        self.vector_url.is_some() && self.vector_api_key.is_some()
    }

    /// Check whether the events feed is configured.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.events_api_key.is_some() && self.events_sheet_id.is_some()
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The catalog access token is absent or empty
    /// - A KV URL is provided without a token (or vice versa)
    /// - A vector URL is provided without an API key (or vice versa)
    /// - A fallback category entry is malformed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog_token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingRequired(
                "catalog access token (BOOKSTAND_CATALOG_TOKEN)".to_string(),
            ));
        }

        match (&self.kv_url, &self.kv_token) {
            (Some(_), None) => {
                return Err(ConfigError::MissingRequired(
                    "KV token (BOOKSTAND_KV_TOKEN) when a KV URL is set".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingRequired(
                    "KV URL (BOOKSTAND_KV_URL) when a KV token is set".to_string(),
                ));
            }
            _ => {}
        }

        match (&self.vector_url, &self.vector_api_key) {
            (Some(_), None) => {
                return Err(ConfigError::MissingRequired(
                    "vector API key (BOOKSTAND_VECTOR_API_KEY) when a vector URL is set"
                        .to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingRequired(
                    "vector URL (BOOKSTAND_VECTOR_URL) when a vector API key is set".to_string(),
                ));
            }
            _ => {}
        }

        self.fallback_category_list()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            bind: "0.0.0.0:8080".parse().unwrap(),
            catalog_url: "https://catalog.example.com".to_string(),
            catalog_token: Some("token".to_string()),
            kv_url: None,
            kv_token: None,
            vector_url: None,
            vector_api_key: None,
            vector_namespace: "books".to_string(),
            events_url: "https://sheets.googleapis.com".to_string(),
            events_api_key: None,
            events_sheet_id: None,
            events_range: "Events!A:E".to_string(),
            category_ids: "cat-1, cat-2,,".to_string(),
            fallback_categories: "cat-1:Fiction, cat-2:Poetry".to_string(),
        }
    }

    #[test]
    fn test_validate_requires_catalog_token() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.catalog_token = None;
        assert!(config.validate().is_err());

        config.catalog_token = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_category_id_list_skips_blanks() {
        let config = base_config();
        assert_eq!(config.category_id_list(), vec!["cat-1", "cat-2"]);
    }

    #[test]
    fn test_fallback_category_pairs() {
        let config = base_config();
        let categories = config.fallback_category_list().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].id, "cat-1");
        assert_eq!(categories[0].name, "Fiction");
        assert_eq!(categories[1].name, "Poetry");
    }

    #[test]
    fn test_fallback_category_rejects_malformed_entries() {
        let mut config = base_config();
        config.fallback_categories = "cat-1".to_string();
        assert!(config.fallback_category_list().is_err());

        config.fallback_categories = ":Fiction".to_string();
        assert!(config.fallback_category_list().is_err());
    }

    #[test]
    fn test_kv_pairing_validation() {
        let mut config = base_config();
        config.kv_url = Some("https://kv.example.com".to_string());
        assert!(config.validate().is_err());

        config.kv_token = Some("secret".to_string());
        assert!(config.validate().is_ok());
        assert!(config.has_remote_kv());
    }

    #[test]
    fn test_optional_integrations_default_off() {
        let config = base_config();
        assert!(!config.has_remote_kv());
        assert!(!config.has_search());
        assert!(!config.has_events());
    }
}
