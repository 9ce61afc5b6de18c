//! Cache tiers, key shapes and TTL policy
//!
//! Each tier is an independent key namespace with its own TTL; invalidating
//! one tier never touches another. TTLs reflect how often the data moves:
//! categories rarely change, image URLs are upstream-issued and can expire
//! on their own, the aggregate snapshot is intentionally short-lived.

use std::time::Duration;

use sha2::{Digest, Sha256};

const DAY: u64 = 24 * 60 * 60;

/// A cache tier: key-prefix namespace plus TTL policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Full category list
    Categories,
    /// All books of one category
    BooksByCategory,
    /// Individual book records
    BookData,
    /// Resolved image URLs
    ImageUrls,
    /// Resolved search results
    SearchResults,
    /// The aggregate snapshot ("super cache")
    Snapshot,
}

impl CacheTier {
    /// Key prefix for this tier
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::BooksByCategory => "books:cat",
            Self::BookData => "book",
            Self::ImageUrls => "image",
            Self::SearchResults => "search",
            Self::Snapshot => "snapshot",
        }
    }

    /// Time-to-live for entries in this tier
    pub fn ttl(self) -> Duration {
        match self {
            Self::Categories => Duration::from_secs(20 * DAY),
            Self::BooksByCategory | Self::BookData | Self::SearchResults => {
                Duration::from_secs(10 * DAY)
            }
            // Shorter: upstream-issued URLs expire independently of content
            Self::ImageUrls => Duration::from_secs(7 * DAY),
            Self::Snapshot => Duration::from_secs(60 * 60),
        }
    }
}

/// Cache key builders, one per tier
pub mod keys {
    use super::{CacheTier, Digest, Sha256};

    /// Key for the full category list
    pub fn categories() -> String {
        format!("{}:all", CacheTier::Categories.prefix())
    }

    /// Key for all books of one category
    pub fn books_by_category(category_id: &str) -> String {
        format!("{}:{category_id}", CacheTier::BooksByCategory.prefix())
    }

    /// Key for a single book record
    pub fn book(book_id: &str) -> String {
        format!("{}:{book_id}", CacheTier::BookData.prefix())
    }

    /// Key for a single resolved image URL
    pub fn image(image_id: &str) -> String {
        format!("{}:{image_id}", CacheTier::ImageUrls.prefix())
    }

    /// Key for a search result set
    ///
    /// The query is normalized (trimmed, lowercased, whitespace collapsed)
    /// before hashing so trivially different spellings share an entry. The
    /// limit is part of the hash: search results are cached post-limit.
    pub fn search(query: &str, limit: usize) -> String {
        let normalized = normalize_query(query);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update(b"|");
        hasher.update(limit.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}:{digest}", CacheTier::SearchResults.prefix())
    }

    /// Key for the aggregate snapshot
    pub fn snapshot() -> String {
        format!("{}:v1", CacheTier::Snapshot.prefix())
    }

    /// Normalize query text for key derivation
    pub fn normalize_query(query: &str) -> String {
        query
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
