//! Server state management and orchestration.
//!
//! Builds the shared application state (cached catalog, snapshot cache,
//! invalidator, optional events client) from configuration and runs the HTTP
//! listener. All cache access goes through the injected store handle; there
//! is no global cache state.

use std::sync::Arc;
use std::time::SystemTime;

use bookstand_cache::{
    CachedCatalog, CacheStore, Invalidator, KvStore, MemoryKvStore, RestKvStore, SnapshotCache,
};
use catalog_client::CatalogClient;
use events_client::EventsClient;
use vector_client::VectorSearchClient;

use crate::config::ServerConfig;
use crate::error::{ConfigError, ServerError};

/// Shared application state for HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Read-through catalog cache
    catalog: Arc<CachedCatalog>,

    /// Aggregate snapshot cache
    snapshots: Arc<SnapshotCache>,

    /// Cache invalidation over the known key families
    invalidator: Invalidator,

    /// Events feed client, absent when not configured
    events: Option<EventsClient>,

    /// Server start time (for the health endpoint)
    started_at: SystemTime,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Selects the remote KV store when configured and an in-memory store
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if a client fails to construct or the
    /// configuration is incomplete.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let store: Arc<dyn KvStore> = match (&config.kv_url, &config.kv_token) {
            (Some(url), Some(token)) => {
                tracing::info!("Using remote KV cache store at {url}");
                Arc::new(RestKvStore::new(url, token)?)
            }
            _ => {
                tracing::info!("No KV store configured, using in-memory cache");
                Arc::new(MemoryKvStore::new())
            }
        };
        Self::with_store(config, store)
    }

    /// Create application state with an explicit cache store.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if a client fails to construct or the
    /// configuration is incomplete.
    pub fn with_store(
        config: &ServerConfig,
        store: Arc<dyn KvStore>,
    ) -> Result<Self, ServerError> {
        let token = config
            .catalog_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingRequired("catalog access token".to_string())
            })?;
        let catalog_client = CatalogClient::new(&config.catalog_url, token)?;

        let cache = CacheStore::new(store);

        let mut catalog = CachedCatalog::new(catalog_client.clone(), cache.clone());
        if let (Some(url), Some(key)) = (&config.vector_url, &config.vector_api_key) {
            tracing::info!("Vector search enabled (namespace {})", config.vector_namespace);
            catalog = catalog.with_search(VectorSearchClient::new(
                url,
                key,
                &config.vector_namespace,
            )?);
        }

        let snapshots = SnapshotCache::new(
            catalog_client,
            cache.clone(),
            config.fallback_category_list()?,
            config.category_id_list(),
        );

        let invalidator = Invalidator::new(cache, config.category_id_list());

        let events = match (&config.events_api_key, &config.events_sheet_id) {
            (Some(key), Some(sheet)) => Some(EventsClient::new(
                &config.events_url,
                key,
                sheet,
                &config.events_range,
            )?),
            _ => None,
        };

        Ok(Self {
            catalog: Arc::new(catalog),
            snapshots: Arc::new(snapshots),
            invalidator,
            events,
            started_at: SystemTime::now(),
        })
    }

    /// Get the read-through catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &Arc<CachedCatalog> {
        &self.catalog
    }

    /// Get the snapshot cache.
    #[must_use]
    pub fn snapshots(&self) -> &Arc<SnapshotCache> {
        &self.snapshots
    }

    /// Get the invalidator.
    #[must_use]
    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    /// Get the events client, if configured.
    #[must_use]
    pub fn events(&self) -> Option<&EventsClient> {
        self.events.as_ref()
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Server orchestration.
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    /// Create a new server with configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if application state cannot be constructed.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;

        tracing::info!(
            "Server initialized (search={}, events={}, snapshot categories={})",
            state.catalog.search_enabled(),
            state.events.is_some(),
            config.category_id_list().len()
        );

        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Run the server until interrupted.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the shutdown signal cannot
    /// be installed.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("HTTP server binding to: {}", self.config.bind);

        let bind = self.config.bind;
        let state = self.state.clone();
        let http_server = tokio::spawn(async move {
            if let Err(e) = crate::http::start_server(bind, state).await {
                tracing::error!("HTTP server failed: {e}");
            }
        });

        tokio::signal::ctrl_c().await.map_err(|e| {
            ServerError::Shutdown(format!("Failed to listen for shutdown signal: {e}"))
        })?;

        tracing::info!("Shutdown signal received, stopping server");
        http_server.abort();

        Ok(())
    }

    /// Get shared application state (for testing).
    #[cfg(test)]
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}
