//! Batch orchestration tests: partition, single upstream call, not_found

use std::sync::Arc;
use std::time::Duration;

use bookstand_cache::{CacheStore, CachedCatalog, MemoryKvStore, keys};
use catalog_client::{Book, CatalogClient, ImageRef};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cached_catalog(server: &MockServer) -> CachedCatalog {
    let catalog = CatalogClient::builder(&server.uri(), "token")
        .max_retries(0)
        .build()
        .unwrap();
    CachedCatalog::new(catalog, CacheStore::new(Arc::new(MemoryKvStore::new())))
}

fn book(id: &str) -> Book {
    Book {
        id: id.to_string(),
        name: format!("Book {id}"),
        description: None,
        price: 15.0,
        currency: "USD".to_string(),
        image_id: None,
        category_id: Some("cat-1".to_string()),
        variation_id: None,
        track_inventory: None,
    }
}

fn item_body(id: &str) -> serde_json::Value {
    json!({
        "type": "ITEM",
        "id": id,
        "item_data": {
            "name": format!("Book {id}"),
            "category_id": "cat-1",
            "variations": [
                {
                    "id": format!("{id}-var"),
                    "item_variation_data": {
                        "price_money": { "amount": 1500, "currency": "USD" }
                    }
                }
            ]
        }
    })
}

#[tokio::test]
async fn mixed_batch_issues_one_call_for_the_uncached_partition() {
    let server = MockServer::start().await;

    // Only B and C may appear in the upstream batch
    Mock::given(method("POST"))
        .and(path("/v2/catalog/batch-retrieve"))
        .and(body_json(json!({ "object_ids": ["B", "C"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [item_body("B"), item_body("C")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = cached_catalog(&server);
    catalog
        .cache()
        .put_json(&keys::book("A"), &book("A"), Duration::from_secs(60))
        .await;

    let outcome = catalog
        .books_batch(&["A".to_string(), "B".to_string(), "C".to_string()])
        .await
        .unwrap();

    assert!(outcome.not_found.is_empty());
    let mut ids: Vec<&str> = outcome.found.iter().map(|b| b.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn ids_missing_everywhere_land_in_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/batch-retrieve"))
        .and(body_json(json!({ "object_ids": ["X"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "objects": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = cached_catalog(&server);
    catalog
        .cache()
        .put_json(&keys::book("A"), &book("A"), Duration::from_secs(60))
        .await;

    let outcome = catalog
        .books_batch(&["A".to_string(), "X".to_string()])
        .await
        .unwrap();

    assert_eq!(outcome.found.len(), 1);
    assert_eq!(outcome.found[0].id, "A");
    assert_eq!(outcome.not_found, vec!["X".to_string()]);
}

#[tokio::test]
async fn fully_cached_batch_never_calls_upstream() {
    let server = MockServer::start().await;
    // No mock mounted: an upstream call would fail the test

    let catalog = cached_catalog(&server);
    catalog
        .cache()
        .put_json(&keys::book("A"), &book("A"), Duration::from_secs(60))
        .await;
    catalog
        .cache()
        .put_json(&keys::book("B"), &book("B"), Duration::from_secs(60))
        .await;

    let outcome = catalog
        .books_batch(&["A".to_string(), "B".to_string(), "A".to_string()])
        .await
        .unwrap();

    // Duplicate input ids are collapsed
    assert_eq!(outcome.found.len(), 2);
    assert!(outcome.not_found.is_empty());
}

#[tokio::test]
async fn freshly_fetched_items_are_cached_individually() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/batch-retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [item_body("B")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = cached_catalog(&server);
    let outcome = catalog.books_batch(&["B".to_string()]).await.unwrap();
    assert_eq!(outcome.found.len(), 1);

    // A later singleton lookup is served from cache, still one upstream call
    let single = catalog.book("B").await.unwrap();
    assert_eq!(single.unwrap().id, "B");
}

#[tokio::test]
async fn image_batch_partitions_and_reports_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/batch-retrieve"))
        .and(body_json(json!({ "object_ids": ["img-2", "img-x"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {
                    "type": "IMAGE",
                    "id": "img-2",
                    "image_data": { "url": "https://cdn.example.com/img-2.jpg" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = cached_catalog(&server);
    catalog
        .cache()
        .put_json(
            &keys::image("img-1"),
            &ImageRef {
                id: "img-1".to_string(),
                url: "https://cdn.example.com/img-1.jpg".to_string(),
            },
            Duration::from_secs(60),
        )
        .await;

    let outcome = catalog
        .images_batch(&[
            "img-1".to_string(),
            "img-2".to_string(),
            "img-x".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(outcome.found.len(), 2);
    assert_eq!(outcome.not_found, vec!["img-x".to_string()]);
}
