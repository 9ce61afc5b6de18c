//! Spreadsheet-backed events feed
//!
//! Rows are fetched read-only and mapped positionally into a fixed record
//! shape: title, date, time, location, description. The feed is decoration
//! for the storefront, so every failure mode collapses to the built-in
//! fallback list with a logged warning rather than an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Error types for events client construction
#[derive(Error, Debug)]
pub enum Error {
    /// API key missing or empty at construction time
    #[error("events feed API key is missing")]
    MissingCredentials,
}

/// Result type for events client construction
pub type Result<T> = std::result::Result<T, Error>;

/// A single storefront event or announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
}

impl EventRecord {
    fn from_row(row: &[String]) -> Option<Self> {
        // Positional mapping; rows shorter than the record shape are skipped
        if row.len() < 5 {
            return None;
        }
        Some(Self {
            title: row[0].clone(),
            date: row[1].clone(),
            time: row[2].clone(),
            location: row[3].clone(),
            description: row[4].clone(),
        })
    }

    /// The hardcoded list served when the feed is unavailable
    pub fn fallback() -> Vec<Self> {
        vec![
            Self {
                title: "Weekly Story Hour".to_string(),
                date: "Every Saturday".to_string(),
                time: "10:30 AM".to_string(),
                location: "Children's Corner".to_string(),
                description: "Picture-book readings for ages 3 to 8.".to_string(),
            },
            Self {
                title: "Local Authors Night".to_string(),
                date: "First Thursday".to_string(),
                time: "7:00 PM".to_string(),
                location: "Main Floor".to_string(),
                description: "Readings and signings with authors from the neighborhood."
                    .to_string(),
            },
        ]
    }
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Read-only client for the spreadsheet row feed
#[derive(Debug, Clone)]
pub struct EventsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    sheet_id: String,
    range: String,
}

impl EventsClient {
    /// Create a new events client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        sheet_id: impl Into<String>,
        range: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::MissingCredentials);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            sheet_id: sheet_id.into(),
            range: range.into(),
        })
    }

    /// Fetch the current events list
    ///
    /// Never fails: transport errors, non-success statuses and malformed
    /// bodies all log a warning and yield the fallback list. The first row is
    /// assumed to be a header and skipped.
    pub async fn fetch_events(&self) -> Vec<EventRecord> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?key={}",
            self.base_url, self.sheet_id, self.range, self.api_key
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("events feed unreachable, serving fallback: {e}");
                return EventRecord::fallback();
            }
        };

        if !response.status().is_success() {
            warn!(
                "events feed returned {}, serving fallback",
                response.status()
            );
            return EventRecord::fallback();
        }

        let rows: RowsResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                warn!("events feed body malformed, serving fallback: {e}");
                return EventRecord::fallback();
            }
        };

        let events: Vec<EventRecord> = rows
            .values
            .iter()
            .skip(1)
            .filter_map(|row| EventRecord::from_row(row))
            .collect();

        if events.is_empty() {
            debug!("events feed had no usable rows, serving fallback");
            return EventRecord::fallback();
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_row_mapping_is_positional() {
        let row: Vec<String> = ["Poetry Open Mic", "2026-09-12", "6 PM", "Cafe", "Bring a poem"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let event = EventRecord::from_row(&row).unwrap();
        assert_eq!(event.title, "Poetry Open Mic");
        assert_eq!(event.location, "Cafe");
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let row = vec!["only".to_string(), "four".to_string()];
        assert!(EventRecord::from_row(&row).is_none());
    }

    #[tokio::test]
    async fn test_feed_rows_are_mapped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Events!A:E"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    ["Title", "Date", "Time", "Location", "Description"],
                    ["Book Club", "2026-09-03", "7 PM", "Back Room", "This month: Beloved"]
                ]
            })))
            .mount(&server)
            .await;

        let client =
            EventsClient::new(server.uri(), "key", "sheet-1", "Events!A:E").unwrap();
        let events = client.fetch_events().await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Book Club");
    }

    #[tokio::test]
    async fn test_feed_failure_serves_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client =
            EventsClient::new(server.uri(), "key", "sheet-1", "Events!A:E").unwrap();
        let events = client.fetch_events().await;

        assert_eq!(events, EventRecord::fallback());
    }
}
