//! VC-Harvester: company records from venture-capital portfolio pages
//!
//! This crate fetches seed pages from VC firm websites, reduces them to a text corpus,
//! asks an extraction collaborator for a company guess, and validates and persists
//! the result as one CSV row per company.

pub mod config;
pub mod crawler;
pub mod extraction;
pub mod logging;
pub mod output;
pub mod record;
pub mod state;
pub mod url;

use thiserror::Error;

/// Setup-level error type for VC-Harvester
///
/// Individual URL failures never surface here; they are reported per task.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Extraction provider error: {0}")]
    Provider(#[from] extraction::ProviderError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to read seed file: {0}")]
    Seeds(#[from] csv::Error),
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for setup operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Fetcher};
pub use extraction::{Extractor, OpenAiExtractor};
pub use output::{BatchReport, CsvSink, RecordSink};
pub use record::{CompanyRecord, RawPayload};
pub use state::{TaskOutcome, TaskStage};
pub use url::{extract_host, parse_web_url, HostMatch};
