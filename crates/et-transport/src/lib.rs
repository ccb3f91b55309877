//! Backend transport for the edit tracker.
//!
//! Provides:
//! - The [`Transport`] seam the tracker flushes records through
//! - An HTTP implementation talking JSON to the aggregation backend
//! - The daily summary query used by reporting commands

use std::fmt;
use std::future::Future;
use std::time::Duration;

use et_core::ActivityRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for backend calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const ACTIVITIES_PATH: &str = "/activities";
const BATCH_PATH: &str = "/activities/batch";
const SUMMARY_PATH: &str = "/activities/summary";

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No backend endpoint is configured.
    #[error("no API endpoint configured")]
    NotConfigured,
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Backend answered with a non-success status.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Hands activity records to the backend.
///
/// A returned `Ok(())` is the only confirmation the tracker trusts before
/// resetting counters. There is no retry inside the transport.
pub trait Transport: Send + Sync + 'static {
    /// Sends one record.
    fn send(
        &self,
        record: &ActivityRecord,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends several records in one request.
    fn send_batch(
        &self,
        records: &[ActivityRecord],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// HTTP client for the aggregation backend.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a client for `api_endpoint`.
    ///
    /// An empty or whitespace-only endpoint is accepted: the client is built
    /// but every request fails with [`TransportError::NotConfigured`], so the
    /// tracker keeps accumulating until the endpoint is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(api_endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let trimmed = api_endpoint.trim().trim_end_matches('/');
        let endpoint = (!trimmed.is_empty()).then(|| trimmed.to_string());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::ClientBuild)?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn url(&self, path: &str) -> Result<String, TransportError> {
        let base = self.endpoint.as_ref().ok_or(TransportError::NotConfigured)?;
        Ok(format!("{base}{path}"))
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), TransportError> {
        let url = self.url(path)?;
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(%url, %status, "backend accepted activity");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(rejection(status.as_u16(), &body))
    }

    /// Fetches the backend's activity totals for `username` on `date`
    /// (`YYYY-MM-DD`).
    pub async fn fetch_summary(
        &self,
        username: &str,
        date: &str,
    ) -> Result<ActivitySummary, TransportError> {
        let url = self.url(SUMMARY_PATH)?;
        let response = self
            .http
            .get(&url)
            .query(&[("username", username), ("date", date)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|err| TransportError::InvalidResponse(err.to_string()))
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        record: &ActivityRecord,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.post_json(ACTIVITIES_PATH, record)
    }

    fn send_batch(
        &self,
        records: &[ActivityRecord],
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            let body = BatchRequest {
                activities: records,
            };
            self.post_json(BATCH_PATH, &body).await
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    activities: &'a [ActivityRecord],
}

/// Per-day totals as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub username: String,
    pub date: String,
    pub typed_lines: u64,
    pub pasted_lines: u64,
    pub total_lines: u64,
    #[serde(default)]
    pub files: Vec<FileSummary>,
}

/// Per-file totals inside an [`ActivitySummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub file_name: String,
    #[serde(default)]
    pub file_path: Option<String>,
    pub typed_lines: u64,
    pub pasted_lines: u64,
    pub total_lines: u64,
}

fn rejection(status: u16, body: &str) -> TransportError {
    let message = parse_api_error(body).unwrap_or_else(|| {
        if body.is_empty() {
            "empty response body".to_string()
        } else {
            body.to_string()
        }
    });
    TransportError::Rejected { status, message }
}

fn parse_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        #[serde(alias = "message")]
        error: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| payload.error)
}
