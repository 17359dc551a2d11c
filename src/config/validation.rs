use crate::config::types::{
    BatchConfig, Config, ExtractionConfig, FetcherConfig, OutputConfig, UserAgentConfig,
};
use crate::url::parse_web_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    validate_batch_config(&config.batch)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "fetcher timeout_secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates extraction provider configuration
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "extraction model cannot be empty".to_string(),
        ));
    }

    parse_web_url(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "extraction max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "extraction timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.sink_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sink_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates batch configuration and inline seeds
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.worker_limit < 1 || config.worker_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "worker_limit must be between 1 and 100, got {}",
            config.worker_limit
        )));
    }

    for seed in &config.seeds {
        parse_web_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }

    Ok(())
}

/// Checks the contact address has a local part and a dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.contains('@') && domain.contains('.') =>
        {
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        ))),
    }
}
