//! Batch fetch orchestration
//!
//! Given a list of identifiers, partition into cached and uncached, issue at
//! most one upstream batch call for the uncached partition, write each fresh
//! item to its singleton key so future single lookups hit, and report ids
//! found nowhere as `not_found` instead of failing the batch. Result order is
//! not guaranteed relative to the input; callers re-index by identifier.

use std::collections::HashMap;

use catalog_client::{Book, ImageRef};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CachedCatalog;
use crate::tier::{CacheTier, keys};
use crate::Result;

/// Outcome of a batch fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome<T> {
    /// Items found in cache or upstream, in no particular order
    pub found: Vec<T>,
    /// Ids absent from both cache and upstream
    pub not_found: Vec<String>,
}

impl<T> BatchOutcome<T> {
    fn empty() -> Self {
        Self {
            found: Vec::new(),
            not_found: Vec::new(),
        }
    }
}

impl CachedCatalog {
    /// Fetch a batch of book records
    ///
    /// Input length must respect the upstream batch maximum; oversized input
    /// surfaces the catalog client's error unchanged.
    pub async fn books_batch(&self, ids: &[String]) -> Result<BatchOutcome<Book>> {
        let ids = dedupe(ids);
        if ids.is_empty() {
            return Ok(BatchOutcome::empty());
        }

        let mut outcome = BatchOutcome::empty();
        let mut uncached = Vec::new();

        for id in &ids {
            match self.cache().get_json::<Book>(&keys::book(id)).await {
                Some(book) => outcome.found.push(book),
                None => uncached.push(id.clone()),
            }
        }

        if uncached.is_empty() {
            return Ok(outcome);
        }
        debug!(
            "book batch: {} cached, {} to fetch",
            outcome.found.len(),
            uncached.len()
        );

        let objects = self.catalog().batch_retrieve(&uncached).await?;
        let mut fetched: HashMap<String, Book> = objects
            .iter()
            .filter_map(Book::from_object)
            .map(|b| (b.id.clone(), b))
            .collect();

        for id in uncached {
            match fetched.remove(&id) {
                Some(book) => {
                    self.cache()
                        .put_json(&keys::book(&id), &book, CacheTier::BookData.ttl())
                        .await;
                    outcome.found.push(book);
                }
                None => outcome.not_found.push(id),
            }
        }

        Ok(outcome)
    }

    /// Fetch a batch of resolved image URLs
    pub async fn images_batch(&self, ids: &[String]) -> Result<BatchOutcome<ImageRef>> {
        let ids = dedupe(ids);
        if ids.is_empty() {
            return Ok(BatchOutcome::empty());
        }

        let mut outcome = BatchOutcome::empty();
        let mut uncached = Vec::new();

        for id in &ids {
            match self.cache().get_json::<ImageRef>(&keys::image(id)).await {
                Some(image) => outcome.found.push(image),
                None => uncached.push(id.clone()),
            }
        }

        if uncached.is_empty() {
            return Ok(outcome);
        }
        debug!(
            "image batch: {} cached, {} to fetch",
            outcome.found.len(),
            uncached.len()
        );

        let objects = self.catalog().batch_retrieve(&uncached).await?;
        let mut fetched: HashMap<String, ImageRef> = objects
            .iter()
            .filter_map(ImageRef::from_object)
            .map(|i| (i.id.clone(), i))
            .collect();

        for id in uncached {
            match fetched.remove(&id) {
                Some(image) => {
                    self.cache()
                        .put_json(&keys::image(&id), &image, CacheTier::ImageUrls.ttl())
                        .await;
                    outcome.found.push(image);
                }
                None => outcome.not_found.push(id),
            }
        }

        Ok(outcome)
    }
}

/// Drop duplicate ids, preserving first occurrence
fn dedupe(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
