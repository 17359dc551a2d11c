//! Chat-completions extraction provider
//!
//! Sends the corpus to an OpenAI-compatible `/chat/completions` endpoint and
//! returns the first choice's message content. Transient provider failures are
//! retried here, with a cap, and never reach the pipeline.

use crate::config::ExtractionConfig;
use crate::extraction::{Extractor, EXTRACTED_FIELDS};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider response had no content")]
    EmptyResponse,
}

impl ProviderError {
    /// Returns true for rate limits, server errors, timeouts and connection failures
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::MissingApiKey(_) | Self::EmptyResponse => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Builds the user prompt for a corpus
pub fn build_prompt(corpus: &str) -> String {
    format!(
        "I will give you the contents of a web page from a venture capital firm's portfolio. \
         Extract the details of the portfolio company described on the page, not of the venture \
         capital firm itself.\n\
         Answer with only a Python dictionary literal with exactly these keys: {}.\n\
         Use None for any value you cannot find. Put multiple values for one key in a single \
         comma-separated string.\n\n{}",
        EXTRACTED_FIELDS.join(", "),
        corpus
    )
}

/// Extraction collaborator backed by a chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    backoff_base: Duration,
}

impl OpenAiExtractor {
    /// Creates an extractor with an explicit API key
    pub fn new(api_key: impl Into<String>, config: &ExtractionConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Creates an extractor reading the API key from the configured environment variable
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ProviderError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(api_key, config)
    }

    /// Overrides the delay before the first retry (doubles per retry)
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Sends one completion request and returns the message content
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract(&self, corpus: &str) -> Option<String> {
        let prompt = build_prompt(corpus);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.complete(&prompt).await {
                Ok(content) => return Some(content),
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let delay = self
                        .backoff_base
                        .saturating_mul(1u32 << (attempt - 1).min(16));
                    tracing::warn!(
                        "Extraction attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!("Extraction gave up after {} attempt(s): {}", attempt, e);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_fields_without_source() {
        let prompt = build_prompt("Amphista Therapeutics");
        assert!(prompt.contains("url, name, description, country, city, email"));
        assert!(!prompt.contains("source"));
        assert!(prompt.ends_with("Amphista Therapeutics"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = ExtractionConfig {
            api_base: "http://localhost:9999/v1/".to_string(),
            ..ExtractionConfig::default()
        };
        let extractor = OpenAiExtractor::new("key", &config).unwrap();
        assert_eq!(extractor.endpoint, "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_missing_api_key() {
        let config = ExtractionConfig {
            api_key_env: "VC_HARVESTER_TEST_UNSET_KEY".to_string(),
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            OpenAiExtractor::from_config(&config),
            Err(ProviderError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_transient_classification() {
        let rate_limited = ProviderError::Http {
            status: 429,
            body: String::new(),
        };
        let unavailable = ProviderError::Http {
            status: 503,
            body: String::new(),
        };
        let unauthorized = ProviderError::Http {
            status: 401,
            body: String::new(),
        };
        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!ProviderError::EmptyResponse.is_transient());
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{'name': 'Amphista'}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{'name': 'Amphista'}")
        );
    }
}
