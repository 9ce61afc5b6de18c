//! Snapshot population from a mock upstream

use std::sync::Arc;

use bookstand_cache::{CacheStore, MemoryKvStore, SnapshotCache, SnapshotStatus};
use catalog_client::{CatalogClient, Category};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn populate_from_upstream_assembles_the_whole_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "type": "CATEGORY", "id": "cat-1", "category_data": { "name": "Fiction" } },
                { "type": "CATEGORY", "id": "cat-2", "category_data": { "name": "Poetry" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories/cat-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {
                    "type": "ITEM",
                    "id": "b1",
                    "item_data": {
                        "name": "Book b1",
                        "image_ids": ["img-1"],
                        "variations": [
                            {
                                "id": "b1-var",
                                "item_variation_data": {
                                    "price_money": { "amount": 900, "currency": "USD" }
                                }
                            }
                        ]
                    }
                },
                { "type": "ITEM", "id": "b2", "item_data": { "name": "Book b2" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/catalog/batch-retrieve"))
        .and(body_json(json!({ "object_ids": ["img-1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {
                    "type": "IMAGE",
                    "id": "img-1",
                    "image_data": { "url": "https://cdn.example.com/img-1.jpg" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = CatalogClient::builder(&server.uri(), "token")
        .max_retries(0)
        .build()
        .unwrap();
    let snapshots = SnapshotCache::new(
        catalog,
        CacheStore::new(Arc::new(MemoryKvStore::new())),
        vec![Category {
            id: "cat-static".to_string(),
            name: "Staff Picks".to_string(),
        }],
        vec!["cat-1".to_string()],
    );

    // Cold read is a miss served from static configuration
    let (fallback, status) = snapshots.read().await;
    assert_eq!(status, SnapshotStatus::Miss);
    assert_eq!(fallback.categories[0].id, "cat-static");

    let report = snapshots.populate_from_upstream().await.unwrap();
    assert!(report.stored);
    assert_eq!(report.metadata.total_books, 2);
    assert_eq!(report.metadata.total_images, 1);

    let (snapshot, status) = snapshots.read().await;
    assert_eq!(status, SnapshotStatus::Hit);
    assert_eq!(snapshot.categories.len(), 2);
    let books = &snapshot.books_by_category["cat-1"];
    // Books with images order first inside the snapshot as well
    assert_eq!(books[0].id, "b1");
    assert_eq!(
        snapshot.image_urls["img-1"],
        "https://cdn.example.com/img-1.jpg"
    );
}
