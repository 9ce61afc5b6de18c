//! Read-through cache policies for the catalog resources
//!
//! Every policy follows the same shape: deterministic key, cache read, hit
//! returns immediately, miss coalesces on the key, fetches through the retry
//! client, transforms, writes with the tier TTL, returns. Cache problems are
//! invisible here, the store adapter already fail-softs them into misses.

use std::collections::HashMap;

use catalog_client::{Book, Category, CatalogClient, ImageRef, MAX_BATCH_OBJECTS};
use tracing::debug;
use vector_client::VectorSearchClient;

use crate::kv::CacheStore;
use crate::singleflight::Flights;
use crate::tier::{CacheTier, keys};
use crate::{Error, Result};

/// Caching layer over the catalog and search providers
///
/// All collaborators are injected; there is no ambient global state.
#[derive(Debug)]
pub struct CachedCatalog {
    catalog: CatalogClient,
    search: Option<VectorSearchClient>,
    cache: CacheStore,
    category_flights: Flights<Vec<Category>>,
    book_list_flights: Flights<Vec<Book>>,
    book_flights: Flights<Option<Book>>,
    image_flights: Flights<Option<ImageRef>>,
}

impl CachedCatalog {
    /// Create a caching catalog without search support
    pub fn new(catalog: CatalogClient, cache: CacheStore) -> Self {
        Self {
            catalog,
            search: None,
            cache,
            category_flights: Flights::new(),
            book_list_flights: Flights::new(),
            book_flights: Flights::new(),
            image_flights: Flights::new(),
        }
    }

    /// Attach a vector search provider
    pub fn with_search(mut self, search: VectorSearchClient) -> Self {
        self.search = Some(search);
        self
    }

    /// Whether search is configured for this deployment
    pub fn search_enabled(&self) -> bool {
        self.search.is_some()
    }

    /// The store adapter, shared with the snapshot cache and invalidator
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The underlying catalog client
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// All catalog categories, cached as one entry
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let key = keys::categories();
        if let Some(cached) = self.cache.get_json::<Vec<Category>>(&key).await {
            return Ok(cached);
        }

        self.category_flights
            .coalesce(&key, || async {
                let categories = self.catalog.list_categories().await?;
                // Empty lists are cached too, a missing upstream category set
                // should not be re-fetched on every request
                self.cache
                    .put_json(&key, &categories, CacheTier::Categories.ttl())
                    .await;
                Ok(categories)
            })
            .await
    }

    /// All books of a category, with an optional response-level limit
    ///
    /// The cache entry always holds the full list ordered books-with-images
    /// first; the limit is applied after the cache read, so one entry serves
    /// differently-limited requests.
    pub async fn books_by_category(
        &self,
        category_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Book>> {
        let key = keys::books_by_category(category_id);

        let all = if let Some(cached) = self.cache.get_json::<Vec<Book>>(&key).await {
            cached
        } else {
            self.book_list_flights
                .coalesce(&key, || async {
                    let mut books = self.catalog.list_category_items(category_id).await?;
                    order_images_first(&mut books);
                    self.cache
                        .put_json(&key, &books, CacheTier::BooksByCategory.ttl())
                        .await;
                    Ok(books)
                })
                .await?
        };

        Ok(apply_limit(all, limit))
    }

    /// A single book record; `Ok(None)` when absent upstream
    pub async fn book(&self, book_id: &str) -> Result<Option<Book>> {
        let key = keys::book(book_id);
        if let Some(cached) = self.cache.get_json::<Book>(&key).await {
            return Ok(Some(cached));
        }

        self.book_flights
            .coalesce(&key, || async {
                let objects = self.catalog.batch_retrieve(&[book_id.to_string()]).await?;
                let book = objects.iter().find_map(Book::from_object);
                if let Some(ref book) = book {
                    self.cache
                        .put_json(&key, book, CacheTier::BookData.ttl())
                        .await;
                }
                Ok(book)
            })
            .await
    }

    /// A single resolved image URL; `Ok(None)` when absent upstream
    pub async fn image_url(&self, image_id: &str) -> Result<Option<ImageRef>> {
        let key = keys::image(image_id);
        if let Some(cached) = self.cache.get_json::<ImageRef>(&key).await {
            return Ok(Some(cached));
        }

        self.image_flights
            .coalesce(&key, || async {
                let image = self.catalog.retrieve_image(image_id).await?;
                if let Some(ref image) = image {
                    self.cache
                        .put_json(&key, image, CacheTier::ImageUrls.ttl())
                        .await;
                }
                Ok(image)
            })
            .await
    }

    /// Search the catalog through the vector provider
    ///
    /// Candidate ids come back ranked from the provider and are resolved to
    /// full records through the catalog batch endpoint, in chunks that
    /// respect the upstream batch maximum, preserving rank order. Results
    /// are cached post-limit, the limit is part of the key.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Book>> {
        let search = self.search.as_ref().ok_or(Error::SearchUnavailable)?;

        let key = keys::search(query, limit);
        if let Some(cached) = self.cache.get_json::<Vec<Book>>(&key).await {
            return Ok(cached);
        }

        self.book_list_flights
            .coalesce(&key, || async {
                let hits = search.search(query.trim(), limit).await?;
                debug!("search {:?} produced {} candidates", query, hits.len());

                let ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
                let mut by_id: HashMap<String, Book> = HashMap::new();
                for chunk in ids.chunks(MAX_BATCH_OBJECTS) {
                    let objects = self.catalog.batch_retrieve(chunk).await?;
                    by_id.extend(
                        objects
                            .iter()
                            .filter_map(Book::from_object)
                            .map(|b| (b.id.clone(), b)),
                    );
                }
                // Re-index by id to restore rank order; candidates the
                // catalog no longer knows are dropped
                let books: Vec<Book> =
                    ids.iter().filter_map(|id| by_id.remove(id)).collect();

                self.cache
                    .put_json(&key, &books, CacheTier::SearchResults.ttl())
                    .await;
                Ok(books)
            })
            .await
    }
}

/// Stable reorder putting books that carry an image reference first
pub(crate) fn order_images_first(books: &mut [Book]) {
    books.sort_by_key(|b| !b.has_image());
}

fn apply_limit(books: Vec<Book>, limit: Option<usize>) -> Vec<Book> {
    match limit {
        Some(limit) if books.len() > limit => books.into_iter().take(limit).collect(),
        _ => books,
    }
}
