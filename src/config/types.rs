use crate::url::HostMatch;
use serde::Deserialize;

/// Main configuration structure for VC-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Page fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetcherConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles for each later retry (milliseconds)
    pub backoff_base_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Extraction provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    /// Chat model name
    pub model: String,

    /// Base URL of the chat-completions API
    pub api_base: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Retries for transient provider failures, after the first call
    pub max_retries: u32,

    /// Provider request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

/// Validation heuristics
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ValidationConfig {
    /// Host comparison used by the domain-collision heuristic
    pub host_match: HostMatch,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV sink
    #[serde(rename = "sink-path")]
    pub sink_path: String,
}

/// Batch execution configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BatchConfig {
    /// Maximum number of seed URLs processed at once
    pub worker_limit: u32,

    /// Seed URLs listed inline
    pub seeds: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_limit: 10,
            seeds: Vec::new(),
        }
    }
}
