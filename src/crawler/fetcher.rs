//! HTTP fetcher for node documents
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for node documents
//! - Retry logic for transient failures
//! - Error classification

use crate::config::UserAgentConfig;
use crate::crawler::{CancelFlag, RetryPolicy};
use crate::document::{DocumentError, TreeDocument};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors produced while fetching a node document
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, timeout, interrupted body, ...
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed document at {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: DocumentError,
    },

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("Request for {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// Returns true if the same request may succeed when repeated
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | Transport failure | yes |
    /// | HTTP 5xx, 408, 429 | yes |
    /// | Other HTTP status | no |
    /// | Malformed XML | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => {
                *status >= 500
                    || *status == StatusCode::REQUEST_TIMEOUT.as_u16()
                    || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            _ => false,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request
///
/// # Example
///
/// ```no_run
/// use qtree_mirror::config::UserAgentConfig;
/// use qtree_mirror::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resolves node URLs to parsed documents
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    policy: RetryPolicy,
    cancel: CancelFlag,
}

impl DocumentFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: CancelFlag::new(),
        }
    }

    /// Makes the fetcher stop retrying once `cancel` is set
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetches and parses a document, retrying transient failures
    ///
    /// Malformed XML and non-retryable HTTP statuses are returned at once.
    /// Transient failures are retried per the [`RetryPolicy`]; once the
    /// budget is spent the last one is wrapped in
    /// [`FetchError::RetriesExhausted`].
    pub async fn fetch(&self, url: &Url) -> Result<TreeDocument, FetchError> {
        let mut attempt = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled {
                    url: url.to_string(),
                });
            }

            attempt += 1;
            let error = match self.fetch_once(url).await {
                Ok(document) => return Ok(document),
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if !self.policy.should_retry(attempt) {
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                "Attempt {}/{} failed: {}; retrying in {:?}",
                attempt,
                self.policy.max_attempts(),
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Performs a single request without retrying
    pub async fn fetch_once(&self, url: &Url) -> Result<TreeDocument, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?;

        TreeDocument::parse(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

/// Classifies a reqwest error into a transport failure
fn transport_error(url: &Url, error: reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else if error.is_body() || error.is_decode() {
        format!("Response body interrupted: {}", error)
    } else {
        error.to_string()
    };

    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}
