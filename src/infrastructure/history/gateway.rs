//! History served by a remote gateway API over HTTP.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  /commits?limit=N` → `{"commits": [CommitRecord]}`
//! - `GET  /commits?search=TERM&limit=N` → `{"commits": [CommitRecord]}`
//! - `POST /commits/files` with `{"hashes": [..]}` → `{"files": {hash: [path]}}`
//!
//! Server errors and transport failures are retried with exponential
//! backoff; client errors fail immediately.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::errors::HistoryError;
use crate::domain::models::CommitRecord;
use crate::domain::ports::CommitHistorySource;

#[derive(Debug, Deserialize)]
struct CommitsResponse {
    commits: Vec<CommitRecord>,
}

#[derive(Debug, Serialize)]
struct FilesRequest<'a> {
    hashes: &'a [String],
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    files: HashMap<String, Vec<String>>,
}

/// Connection settings for [`GatewayHistorySource`].
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total time spent retrying a request before giving up.
    pub max_retry_elapsed: Duration,
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            max_retry_elapsed: Duration::from_secs(30),
        }
    }
}

/// `CommitHistorySource` backed by the gateway API.
pub struct GatewayHistorySource {
    client: Client,
    settings: GatewaySettings,
}

impl GatewayHistorySource {
    pub fn new(settings: GatewaySettings) -> Result<Self, HistoryError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| HistoryError::Gateway(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(self.settings.max_retry_elapsed),
            ..ExponentialBackoff::default()
        }
    }

    async fn send<T, F>(&self, build: F) -> Result<T, HistoryError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let build = &build;
        backoff::future::retry(self.backoff(), || async move {
            let response = build().send().await.map_err(|e| {
                warn!(error = %e, "gateway request failed, retrying");
                backoff::Error::transient(HistoryError::Gateway(e.to_string()))
            })?;

            let status = response.status();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                warn!(%status, "gateway unavailable, retrying");
                return Err(backoff::Error::transient(HistoryError::Gateway(format!(
                    "gateway returned {status}"
                ))));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(HistoryError::Gateway(format!(
                    "gateway returned {status}"
                ))));
            }

            response.json::<T>().await.map_err(|e| {
                backoff::Error::permanent(HistoryError::Malformed(format!(
                    "gateway response: {e}"
                )))
            })
        })
        .await
    }
}

#[async_trait]
impl CommitHistorySource for GatewayHistorySource {
    async fn list_commits(&self, limit: usize) -> Result<Vec<CommitRecord>, HistoryError> {
        debug!(limit, "fetching commits from gateway");
        let url = self.url("/commits");
        let response: CommitsResponse = self
            .send(|| self.client.get(&url).query(&[("limit", limit.to_string())]))
            .await?;
        Ok(response.commits)
    }

    async fn list_commits_matching(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CommitRecord>, HistoryError> {
        debug!(term, limit, "searching commits on gateway");
        let url = self.url("/commits");
        let response: CommitsResponse = self
            .send(|| {
                self.client
                    .get(&url)
                    .query(&[("search", term.to_string()), ("limit", limit.to_string())])
            })
            .await?;
        Ok(response.commits)
    }

    async fn file_changes_for(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, Vec<String>>, HistoryError> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }
        let url = self.url("/commits/files");
        let body = FilesRequest { hashes };
        let response: FilesResponse = self.send(|| self.client.post(&url).json(&body)).await?;
        Ok(response.files)
    }
}
