//! REST client for the remote KV store

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{KvError, KvResult, KvStore};

/// Default request timeout for store calls; the store is an optimization, a
/// slow store should lose to the upstream fetch, not stall it
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize)]
struct SetRequest<'a> {
    value: &'a str,
    ttl_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    #[serde(default)]
    exists: bool,
}

/// Bearer-token REST client for the remote KV store
///
/// Endpoints: `GET|POST|DELETE /v1/kv/{key}` plus `GET /v1/kv/{key}/exists`.
/// TTL travels in the set body, per call.
#[derive(Debug, Clone)]
pub struct RestKvStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestKvStore {
    /// Create a new store client
    ///
    /// Fails when the token is empty; absent credentials are a
    /// construction-time error.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> KvResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(KvError::MissingCredentials);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/v1/kv/{key}", self.base_url)
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let response = self
            .client
            .get(self.key_url(key))
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => {
                let body: GetResponse = response.json().await?;
                trace!("kv get {key}: {} bytes", body.value.len());
                Ok(Some(body.value))
            }
            404 => Ok(None),
            status => Err(KvError::Status { status }),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let response = self
            .client
            .post(self.key_url(key))
            .bearer_auth(&self.token)
            .json(&SetRequest {
                value,
                ttl_seconds: ttl.as_secs(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(KvError::Status {
                status: status.as_u16(),
            })
        }
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        let response = self
            .client
            .delete(self.key_url(key))
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => {
                let body: DeleteResponse = response.json().await?;
                Ok(body.deleted)
            }
            404 => Ok(false),
            status => Err(KvError::Status { status }),
        }
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        let response = self
            .client
            .get(format!("{}/exists", self.key_url(key)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: ExistsResponse = response.json().await?;
            Ok(body.exists)
        } else {
            Err(KvError::Status {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_missing_token_rejected() {
        assert!(matches!(
            RestKvStore::new("https://kv.example.com", ""),
            Err(KvError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_get_hit_and_miss() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/book:1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "cached" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/kv/book:2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = RestKvStore::new(server.uri(), "tok").unwrap();
        assert_eq!(store.get("book:1").await.unwrap().as_deref(), Some("cached"));
        assert_eq!(store.get("book:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_sends_ttl_in_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/kv/book:1"))
            .and(body_json(json!({ "value": "v", "ttl_seconds": 864000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestKvStore::new(server.uri(), "tok").unwrap();
        store
            .set("book:1", "v", Duration::from_secs(864_000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = RestKvStore::new(server.uri(), "tok").unwrap();
        assert!(matches!(
            store.get("k").await,
            Err(KvError::Status { status: 500 })
        ));
    }
}
