//! Scope-based cache invalidation
//!
//! The store has no pattern scan, so bulk invalidation walks a
//! hand-maintained list of known keys: the categories entry, the snapshot
//! entry and the per-category book lists for the configured default
//! categories. Singleton tiers (book records, image URLs) can only be
//! cleared one id at a time; a scoped request without an id reports that
//! instead of guessing keys.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::kv::CacheStore;
use crate::tier::keys;

/// Invalidation scope, matching the operator wire strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Categories,
    BooksByCategory,
    BookData,
    ImageUrls,
    All,
}

impl Scope {
    /// Wire string for this scope
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::BooksByCategory => "books-by-category",
            Self::BookData => "book-data",
            Self::ImageUrls => "image-urls",
            Self::All => "all",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "categories" => Ok(Self::Categories),
            "books-by-category" => Ok(Self::BooksByCategory),
            "book-data" => Ok(Self::BookData),
            "image-urls" => Ok(Self::ImageUrls),
            "all" => Ok(Self::All),
            other => Err(format!("unknown invalidation scope: {other}")),
        }
    }
}

/// What an invalidation pass actually cleared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationReport {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Number of keys that held a value and were removed
    pub cleared: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Operator-facing invalidation over the known-key list
#[derive(Debug, Clone)]
pub struct Invalidator {
    cache: CacheStore,
    default_category_ids: Vec<String>,
}

impl Invalidator {
    /// Create an invalidator
    ///
    /// `default_category_ids` is the hand-maintained list that stands in for
    /// the pattern scan the store does not have.
    pub fn new(cache: CacheStore, default_category_ids: Vec<String>) -> Self {
        Self {
            cache,
            default_category_ids,
        }
    }

    /// Invalidate one scope, optionally narrowed to a single identifier
    pub async fn invalidate(&self, scope: Scope, id: Option<&str>) -> InvalidationReport {
        let mut cleared = 0;
        let mut note = None;

        match (scope, id) {
            (Scope::Categories, _) => {
                cleared += usize::from(self.cache.delete(&keys::categories()).await);
            }
            (Scope::BooksByCategory, Some(id)) => {
                cleared += usize::from(self.cache.delete(&keys::books_by_category(id)).await);
            }
            (Scope::BooksByCategory, None) => {
                for id in &self.default_category_ids {
                    cleared += usize::from(self.cache.delete(&keys::books_by_category(id)).await);
                }
            }
            (Scope::BookData, Some(id)) => {
                cleared += usize::from(self.cache.delete(&keys::book(id)).await);
            }
            (Scope::BookData, None) => {
                note = Some(
                    "book-data requires an id: the store has no key scan and book keys are not enumerable"
                        .to_string(),
                );
            }
            (Scope::ImageUrls, Some(id)) => {
                cleared += usize::from(self.cache.delete(&keys::image(id)).await);
            }
            (Scope::ImageUrls, None) => {
                note = Some(
                    "image-urls requires an id: the store has no key scan and image keys are not enumerable"
                        .to_string(),
                );
            }
            (Scope::All, _) => {
                cleared += usize::from(self.cache.delete(&keys::categories()).await);
                cleared += usize::from(self.cache.delete(&keys::snapshot()).await);
                for id in &self.default_category_ids {
                    cleared += usize::from(self.cache.delete(&keys::books_by_category(id)).await);
                }
                note = Some(
                    "book, image and search entries are not enumerable and expire by TTL"
                        .to_string(),
                );
            }
        }

        info!("invalidated scope {} (id {:?}): {} keys", scope.as_str(), id, cleared);
        InvalidationReport {
            scope: scope.as_str().to_string(),
            id: id.map(ToString::to_string),
            cleared,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KvStore, MemoryKvStore};
    use std::sync::Arc;
    use std::time::Duration;

    async fn seeded_store() -> (Arc<MemoryKvStore>, Invalidator) {
        let store = Arc::new(MemoryKvStore::new());
        let ttl = Duration::from_secs(60);
        store.set("categories:all", "[]", ttl).await.unwrap();
        store.set("books:cat:cat-1", "[]", ttl).await.unwrap();
        store.set("books:cat:cat-2", "[]", ttl).await.unwrap();
        store.set("book:b1", "{}", ttl).await.unwrap();
        store.set("snapshot:v1", "{}", ttl).await.unwrap();

        let invalidator = Invalidator::new(
            CacheStore::new(Arc::clone(&store) as Arc<dyn KvStore>),
            vec!["cat-1".to_string(), "cat-2".to_string()],
        );
        (store, invalidator)
    }

    #[test]
    fn test_scope_wire_strings_round_trip() {
        for scope in [
            Scope::Categories,
            Scope::BooksByCategory,
            Scope::BookData,
            Scope::ImageUrls,
            Scope::All,
        ] {
            assert_eq!(scope.as_str().parse::<Scope>().unwrap(), scope);
        }
        assert!("everything".parse::<Scope>().is_err());
    }

    #[tokio::test]
    async fn test_scoped_invalidation_is_tier_local() {
        let (store, invalidator) = seeded_store().await;

        let report = invalidator.invalidate(Scope::Categories, None).await;
        assert_eq!(report.cleared, 1);

        // Other tiers are untouched
        assert!(store.exists("books:cat:cat-1").await.unwrap());
        assert!(store.exists("book:b1").await.unwrap());
        assert!(store.exists("snapshot:v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_books_scope_iterates_default_categories() {
        let (store, invalidator) = seeded_store().await;

        let report = invalidator.invalidate(Scope::BooksByCategory, None).await;
        assert_eq!(report.cleared, 2);
        assert!(!store.exists("books:cat:cat-1").await.unwrap());
        assert!(!store.exists("books:cat:cat-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_book_scope_narrowed_by_id() {
        let (store, invalidator) = seeded_store().await;

        let report = invalidator.invalidate(Scope::BookData, Some("b1")).await;
        assert_eq!(report.cleared, 1);
        assert!(!store.exists("book:b1").await.unwrap());

        // Without an id nothing is guessed
        let report = invalidator.invalidate(Scope::BookData, None).await;
        assert_eq!(report.cleared, 0);
        assert!(report.note.is_some());
    }

    #[tokio::test]
    async fn test_all_scope_clears_enumerable_keys() {
        let (store, invalidator) = seeded_store().await;

        let report = invalidator.invalidate(Scope::All, None).await;
        // categories + snapshot + two default category lists
        assert_eq!(report.cleared, 4);
        assert!(store.exists("book:b1").await.unwrap());
    }
}
