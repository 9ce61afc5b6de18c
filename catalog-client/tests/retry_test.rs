//! Retry behavior tests against a mock upstream

use std::time::Instant;

use catalog_client::{CatalogClient, Error};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn categories_body() -> serde_json::Value {
    json!({
        "objects": [
            { "type": "CATEGORY", "id": "cat-1", "category_data": { "name": "Fiction" } },
            { "type": "CATEGORY", "id": "cat-2", "category_data": { "name": "Poetry" } }
        ]
    })
}

#[tokio::test]
async fn rate_limited_twice_then_success_makes_three_calls() {
    let server = MockServer::start().await;

    // First two attempts are rate limited, the third succeeds
    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::builder(&server.uri(), "token")
        .max_retries(3)
        .initial_backoff_ms(50)
        .jitter_factor(0.0)
        .build()
        .unwrap();

    let start = Instant::now();
    let categories = client.list_categories().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].name, "Fiction");

    // Two backoffs: 50ms * 2^0 + 50ms * 2^1
    assert!(
        elapsed.as_millis() >= 150,
        "expected at least 150ms of backoff, got {elapsed:?}"
    );
}

#[tokio::test]
async fn rate_limit_exhaustion_surfaces_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .expect(3)
        .mount(&server)
        .await;

    let client = CatalogClient::builder(&server.uri(), "token")
        .max_retries(2)
        .initial_backoff_ms(10)
        .jitter_factor(0.0)
        .build()
        .unwrap();

    let err = client.list_categories().await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after_secs: 7 }));
}

#[tokio::test]
async fn non_retryable_status_fails_immediately_with_body() {
    let server = MockServer::start().await;

    // A 500 is not retried: exactly one call even with retries configured
    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::builder(&server.uri(), "token")
        .max_retries(3)
        .initial_backoff_ms(10)
        .jitter_factor(0.0)
        .build()
        .unwrap();

    let err = client.list_categories().await.unwrap_err();
    match err {
        Error::UpstreamStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        e => panic!("expected UpstreamStatus, got: {e:?}"),
    }
}

#[tokio::test]
async fn requests_carry_auth_and_version_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/catalog/categories"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("catalog-version", "2025-01-23"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = CatalogClient::new(&server.uri(), "secret-token").unwrap();
    let categories = client.list_categories().await.unwrap();
    assert_eq!(categories.len(), 2);
}

#[tokio::test]
async fn batch_retrieve_posts_requested_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/batch-retrieve"))
        .and(wiremock::matchers::body_json(json!({
            "object_ids": ["book-1", "img-1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {
                    "type": "ITEM",
                    "id": "book-1",
                    "item_data": {
                        "name": "Ficciones",
                        "variations": [
                            {
                                "id": "book-1-var",
                                "item_variation_data": {
                                    "price_money": { "amount": 950, "currency": "USD" }
                                }
                            }
                        ]
                    }
                },
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

    let client = CatalogClient::new(&server.uri(), "token").unwrap();
    let objects = client
        .batch_retrieve(&["book-1".to_string(), "img-1".to_string()])
        .await
        .unwrap();

    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].object_type, "ITEM");
    assert_eq!(objects[1].object_type, "IMAGE");
}
