//! HTTP fetcher implementation
//!
//! This module handles all page requests for the pipeline, including:
//! - Building HTTP clients with proper user agent strings
//! - Bounded retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Terminal failure of a page fetch, classified by kind
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url} after {attempts} attempt(s)")]
    Http { url: String, status: u16, attempts: u32 },

    #[error("Connection error for {url} after {attempts} attempt(s): {message}")]
    Connection {
        url: String,
        message: String,
        attempts: u32,
    },

    #[error("Request timeout for {url} after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("Fetch failed for {url}: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// Short label for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Connection { .. } => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Other { .. } => "other",
        }
    }

    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Http { attempts, .. }
            | Self::Connection { attempts, .. }
            | Self::Timeout { attempts, .. } => *attempts,
            Self::Other { .. } => 1,
        }
    }
}

/// Outcome of a single request attempt
#[derive(Debug)]
enum AttemptError {
    Status(StatusCode),
    Connection(String),
    Timeout,
    Other(String),
}

impl AttemptError {
    /// Returns true for 429, 5xx, connection failures and timeouts
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::Connection(_) | Self::Timeout => true,
            Self::Other(_) => false,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() || e.is_request() || e.is_body() {
            Self::Connection(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }

    fn into_fetch_error(self, url: &str, attempts: u32) -> FetchError {
        let url = url.to_string();
        match self {
            Self::Status(status) => FetchError::Http {
                url,
                status: status.as_u16(),
                attempts,
            },
            Self::Connection(message) => FetchError::Connection {
                url,
                message,
                attempts,
            },
            Self::Timeout => FetchError::Timeout { url, attempts },
            Self::Other(message) => FetchError::Other { url, message },
        }
    }
}

/// Retry and timeout settings for page fetches
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Per-request timeout
    pub timeout: Duration,

    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub backoff_base: Duration,
}

impl FetchPolicy {
    /// Delay to wait after the given failed attempt (1-based): base, 2×base, 4×base, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&FetcherConfig::default())
    }
}

impl From<&FetcherConfig> for FetchPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use vc_harvester::config::UserAgentConfig;
/// use vc_harvester::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "VcHarvester".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resilient page fetcher
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Creates a fetcher from an already-built client
    pub fn new(client: Client, policy: FetchPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &FetcherConfig,
    ) -> Result<Self, reqwest::Error> {
        let policy = FetchPolicy::from(config);
        let client = build_http_client(user_agent, policy.timeout)?;
        Ok(Self::new(client, policy))
    }

    /// The retry policy in use
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches a URL and returns its body text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 429, 5xx | Retry with backoff |
    /// | Connection failure, timeout | Retry with backoff |
    /// | Other HTTP status | Fail immediately |
    ///
    /// At most `max_attempts` requests are sent. The delay after attempt `n`
    /// is `backoff_base * 2^(n-1)`.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.fetch_once(url).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} ({} bytes, attempt {})", url, body.len(), attempt);
                    return Ok(body);
                }
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.policy.max_attempts {
                return Err(error.into_fetch_error(url, attempt));
            }

            let delay = self.policy.backoff_delay(attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({:?}), retrying in {:?}",
                attempt,
                self.policy.max_attempts,
                url,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        response.text().await.map_err(AttemptError::from_reqwest)
    }
}
