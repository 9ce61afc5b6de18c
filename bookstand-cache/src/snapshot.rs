//! Aggregate snapshot cache ("super cache")
//!
//! One composite object bundling categories, per-category book lists and an
//! image-URL map, stored whole under a single key with its own short TTL and
//! read atomically. Reads never populate: a miss returns a minimal fallback
//! immediately and population is a separate, explicitly triggered step. The
//! snapshot deliberately duplicates data the per-resource tiers also hold;
//! the two layers are independent and share no invalidation linkage.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use catalog_client::{Book, CatalogClient, Category, ImageRef, MAX_BATCH_OBJECTS};
use futures::future;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::order_images_first;
use crate::kv::CacheStore;
use crate::tier::{CacheTier, keys};
use crate::Result;

/// Whether a snapshot read was served from the store or the fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// Snapshot present and unexpired
    Hit,
    /// No snapshot stored, or expired
    Miss,
}

impl SnapshotStatus {
    /// Value for the `x-cache-status` response header
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// Aggregate metadata computed at population time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub total_books: usize,
    pub total_images: usize,
    /// Unix timestamp of the population step
    pub cached_at: u64,
    pub ttl_seconds: u64,
}

/// The stored composite object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub categories: Vec<Category>,
    pub books_by_category: BTreeMap<String, Vec<Book>>,
    pub image_urls: BTreeMap<String, String>,
    pub metadata: SnapshotMetadata,
}

/// Pre-assembled data for an externally supplied population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub books_by_category: BTreeMap<String, Vec<Book>>,
    #[serde(default)]
    pub image_urls: BTreeMap<String, String>,
}

/// Result of a population step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulateReport {
    /// Whether the snapshot reached the store; a fail-soft store write can
    /// lose it, and operators re-trigger rather than the request failing
    pub stored: bool,
    pub metadata: SnapshotMetadata,
}

/// The aggregate snapshot cache
#[derive(Debug)]
pub struct SnapshotCache {
    catalog: CatalogClient,
    cache: CacheStore,
    fallback_categories: Vec<Category>,
    default_category_ids: Vec<String>,
}

impl SnapshotCache {
    /// Create a snapshot cache
    ///
    /// `fallback_categories` come from static configuration and are served on
    /// a miss; `default_category_ids` drive upstream population.
    pub fn new(
        catalog: CatalogClient,
        cache: CacheStore,
        fallback_categories: Vec<Category>,
        default_category_ids: Vec<String>,
    ) -> Self {
        Self {
            catalog,
            cache,
            fallback_categories,
            default_category_ids,
        }
    }

    /// Read the snapshot atomically
    ///
    /// A miss returns the fallback shape immediately; the read path never
    /// blocks on population.
    pub async fn read(&self) -> (Snapshot, SnapshotStatus) {
        if let Some(snapshot) = self.cache.get_json::<Snapshot>(&keys::snapshot()).await {
            return (snapshot, SnapshotStatus::Hit);
        }

        debug!("snapshot miss, serving static fallback");
        let fallback = Snapshot {
            categories: self.fallback_categories.clone(),
            books_by_category: BTreeMap::new(),
            image_urls: BTreeMap::new(),
            metadata: SnapshotMetadata {
                total_books: 0,
                total_images: 0,
                cached_at: 0,
                ttl_seconds: 0,
            },
        };
        (fallback, SnapshotStatus::Miss)
    }

    /// Store a snapshot from pre-assembled data
    pub async fn populate_with(&self, data: SnapshotData) -> PopulateReport {
        let ttl = CacheTier::Snapshot.ttl();
        let metadata = SnapshotMetadata {
            total_books: data.books_by_category.values().map(Vec::len).sum(),
            total_images: data.image_urls.len(),
            cached_at: unix_now(),
            ttl_seconds: ttl.as_secs(),
        };

        let snapshot = Snapshot {
            categories: data.categories,
            books_by_category: data.books_by_category,
            image_urls: data.image_urls,
            metadata: metadata.clone(),
        };

        let stored = self.cache.put_json(&keys::snapshot(), &snapshot, ttl).await;
        info!(
            "snapshot populated: {} books, {} images, stored={stored}",
            metadata.total_books, metadata.total_images
        );
        PopulateReport { stored, metadata }
    }

    /// Fetch everything from upstream and store a fresh snapshot
    ///
    /// Categories come first, then the configured default categories' books
    /// are fetched fanned out, then the referenced images are batch-resolved
    /// in chunks that respect the upstream batch maximum.
    pub async fn populate_from_upstream(&self) -> Result<PopulateReport> {
        let categories = self.catalog.list_categories().await?;

        let fetches = self.default_category_ids.iter().map(|id| async move {
            let books = self.catalog.list_category_items(id).await;
            (id.clone(), books)
        });
        let mut books_by_category = BTreeMap::new();
        for (id, result) in future::join_all(fetches).await {
            let mut books = result?;
            order_images_first(&mut books);
            books_by_category.insert(id, books);
        }

        let image_ids: Vec<String> = books_by_category
            .values()
            .flatten()
            .filter_map(|b| b.image_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut image_urls = BTreeMap::new();
        for chunk in image_ids.chunks(MAX_BATCH_OBJECTS) {
            let objects = self.catalog.batch_retrieve(chunk).await?;
            for image in objects.iter().filter_map(ImageRef::from_object) {
                image_urls.insert(image.id, image.url);
            }
        }

        Ok(self
            .populate_with(SnapshotData {
                categories,
                books_by_category,
                image_urls,
            })
            .await)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
