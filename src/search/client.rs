use crate::error::SearchError;
use crate::events::LogEntry;
use crate::search::SearchQuery;
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Trait for search backend implementations
///
/// A backend executes a raw request body against an index pattern and
/// returns the decoded entries in the order the backend ranked them.
#[cfg_attr(test, mockall::automock)]
pub trait SearchBackend: Send + Sync {
    fn search(
        &self,
        index_pattern: &str,
        body: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LogEntry>, SearchError>> + Send>>;
}

/// Elasticsearch backend speaking the `_search` HTTP API
///
/// A single `reqwest::Client` is created up front and reused for every
/// request, so all searches share one connection pool.
pub struct ElasticsearchBackend {
    client: Client,
    endpoint: String,
}

/// Response format of the `_search` API (only the parts we read)
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Value,
}

impl ElasticsearchBackend {
    /// Create a new Elasticsearch backend
    ///
    /// # Arguments
    /// * `endpoint` - Base URL (e.g., "http://localhost:9200")
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Http` if the HTTP client cannot be built.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    /// Format the `_search` URL for an index pattern
    fn search_url(&self, index_pattern: &str) -> String {
        format!(
            "{}/{}/_search",
            self.endpoint.trim_end_matches('/'),
            index_pattern
        )
    }

    /// Decode a `_search` response body into log entries
    ///
    /// Hits whose `_source` cannot be decoded are logged and skipped; the
    /// remaining entries keep the backend's order.
    fn parse_response(body: &str) -> Result<Vec<LogEntry>, SearchError> {
        let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
            SearchError::InvalidResponse(format!("Failed to parse search response: {}", e))
        })?;

        let entries = response
            .hits
            .hits
            .into_iter()
            .enumerate()
            .filter_map(|(position, hit)| match LogEntry::from_source(hit.source) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping search hit {}: failed to decode source: {}", position, e);
                    None
                }
            })
            .collect();

        Ok(entries)
    }
}

impl SearchBackend for ElasticsearchBackend {
    fn search(
        &self,
        index_pattern: &str,
        body: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LogEntry>, SearchError>> + Send>> {
        let client = self.client.clone();
        let url = self.search_url(index_pattern);
        let index_pattern = index_pattern.to_string();

        Box::pin(async move {
            debug!("Sending search request to {}", url);

            let response = client.post(&url).json(&body).send().await?;
            let status = response.status();
            let text = response.text().await?;

            if status == StatusCode::NOT_FOUND {
                return Err(SearchError::IndexNotFound(index_pattern));
            }

            if !status.is_success() {
                return Err(SearchError::BackendError {
                    status: status.as_u16(),
                    body: text,
                });
            }

            Self::parse_response(&text)
        })
    }
}

/// Search facade used by the monitor
///
/// Wraps a backend and applies the error policy: every failure is logged and
/// turned into an empty result so a single bad poll never stops the loop.
#[derive(Clone)]
pub struct SearchClient {
    backend: Arc<dyn SearchBackend>,
}

impl SearchClient {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Run the time-windowed error search
    pub async fn search(&self, index_pattern: &str, query: &SearchQuery) -> Vec<LogEntry> {
        match self
            .backend
            .search(index_pattern, query.to_request_body())
            .await
        {
            Ok(entries) => {
                info!("Found {} log entries matching the query.", entries.len());
                entries
            }
            Err(SearchError::IndexNotFound(_)) => {
                warn!("No indices matching pattern {} found.", index_pattern);
                Vec::new()
            }
            Err(e) => {
                error!("An error occurred while querying the search backend: {}", e);
                Vec::new()
            }
        }
    }

    /// Run a plain message match, not limited to a time window
    pub async fn search_by_pattern(&self, index_pattern: &str, pattern: &str) -> Vec<LogEntry> {
        let body = json!({ "query": { "match": { "message": pattern } } });

        match self.backend.search(index_pattern, body).await {
            Ok(entries) => {
                info!(
                    "Performed additional search with pattern '{}', found {} entries.",
                    pattern,
                    entries.len()
                );
                entries
            }
            Err(SearchError::IndexNotFound(_)) => {
                warn!(
                    "No indices matching pattern {} found for additional search '{}'.",
                    index_pattern, pattern
                );
                Vec::new()
            }
            Err(e) => {
                error!(
                    "Additional search with pattern '{}' failed: {}",
                    pattern, e
                );
                Vec::new()
            }
        }
    }
}
