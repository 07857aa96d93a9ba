//! Tavily search client
//!
//! Calls the Tavily Search API (`POST {base_url}/search`) and maps HTTP
//! failures onto [`SearchError`].
//!
//! # Production Features
//!
//! - Configurable base URL, timeout and retry count
//! - Exponential backoff on transient errors only (timeouts, connection
//!   failures, 429, 5xx)
//! - Lenient response decoding: missing result fields default to empty

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{SearchError, SearchHit, SearchProvider, SearchRequest};

/// Public Tavily endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Default timeout for Tavily API requests
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Upper bound on a single backoff sleep
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Maximum query length accepted by Tavily
const MAX_QUERY_LEN: usize = 400;

/// Tavily-backed [`SearchProvider`]
///
/// # Example
/// ```ignore
/// let client = TavilySearchClient::new("tvly-...")
///     .with_timeout(Duration::from_secs(20))
///     .with_max_retries(2);
/// let hits = client.search(&SearchRequest::new("Acme products")).await?;
/// ```
pub struct TavilySearchClient {
    api_key: String,
    client: Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl TavilySearchClient {
    /// Create a client with the given API key.
    ///
    /// Retries default to zero: a failing query is reported once.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }

    /// Create from environment variable TAVILY_API_KEY
    pub fn from_env() -> Result<Self, SearchError> {
        match std::env::var("TAVILY_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(SearchError::Unauthorized),
        }
    }

    /// Point the client at another endpoint (proxies, mocks)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Sleep before retry `attempt` (1-based): base * 2^(attempt-1), capped
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.retry_base_delay
            .checked_mul(factor)
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    /// Execute HTTP request with retry and backoff
    async fn execute_with_retry(
        &self,
        request: &TavilyRequest,
    ) -> Result<TavilyResponse, SearchError> {
        let mut last_error = SearchError::Unknown("No attempts made".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                debug!(attempt, delay_ms = delay.as_millis(), "Retrying Tavily request");
                tokio::time::sleep(delay).await;
            }

            match self.execute_single_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    warn!(attempt, error = %e, "Tavily request failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn execute_single_request(
        &self,
        request: &TavilyRequest,
    ) -> Result<TavilyResponse, SearchError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::Connection(e.to_string())
                } else {
                    SearchError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| SearchError::ParseError(e.to_string()));
        }

        let error_text = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(SearchError::Unauthorized),
            429 => Err(SearchError::RateLimited),
            400 => Err(SearchError::BadRequest(error_text)),
            500..=599 => Err(SearchError::ServerError(status.as_u16(), error_text)),
            _ => Err(SearchError::HttpError(status.as_u16(), error_text)),
        }
    }
}

/// Request body for Tavily API
#[derive(Debug, Serialize)]
struct TavilyRequest {
    query: String,
    max_results: u32,
    search_depth: String,
    topic: String,
    include_answer: bool,
    include_raw_content: bool,
}

impl TavilyRequest {
    fn from_search(request: &SearchRequest) -> Self {
        Self {
            query: request.query.clone(),
            max_results: request.max_results.clamp(1, 20),
            search_depth: request.search_depth.as_str().to_string(),
            topic: "general".to_string(),
            include_answer: false,
            include_raw_content: false,
        }
    }
}

/// Response from Tavily API
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

impl From<TavilyResult> for SearchHit {
    fn from(result: TavilyResult) -> Self {
        SearchHit {
            title: result.title,
            url: result.url,
            content: result.content,
            score: result.score,
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        if request.query.len() > MAX_QUERY_LEN {
            return Err(SearchError::BadRequest(format!(
                "Query too long (max {} characters)",
                MAX_QUERY_LEN
            )));
        }

        let body = TavilyRequest::from_search(request);
        debug!(query = %body.query, depth = %body.search_depth, "Executing Tavily search");

        let response = self.execute_with_retry(&body).await?;
        Ok(response.results.into_iter().map(SearchHit::from).collect())
    }

    fn name(&self) -> &str {
        "tavily"
    }
}
