use crate::config::types::{
    Config, CredentialsConfig, DispatcherConfig, OutputConfig, RetryConfig, SourceConfig,
    SummarizerConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_dispatcher_config(&config.dispatcher)?;
    validate_retry_config(&config.retry)?;
    validate_credentials_config(&config.credentials)?;
    validate_summarizer_config(&config.summarizer)?;
    validate_output_config(&config.output)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates the page source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() && config.sitemap.is_none() {
        return Err(ConfigError::Validation(
            "source needs at least one seed URL or a sitemap".to_string(),
        ));
    }

    for seed in &config.seeds {
        validate_http_url(seed, "seed URL")?;
    }

    if let Some(sitemap) = &config.sitemap {
        validate_http_url(sitemap, "sitemap URL")?;
    }

    if let Some(pattern) = &config.pattern {
        validate_pattern(pattern)?;
    }

    if config.buffer_size < 1 {
        return Err(ConfigError::Validation(
            "buffer_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates dispatcher configuration
fn validate_dispatcher_config(config: &DispatcherConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_jobs < 1 || config.max_concurrent_jobs > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_jobs must be between 1 and 100, got {}",
            config.max_concurrent_jobs
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.base_delay_secs < 1 {
        return Err(ConfigError::Validation(
            "base_delay_secs must be >= 1".to_string(),
        ));
    }

    if config.min_delay_secs < 1 {
        return Err(ConfigError::Validation(
            "min_delay_secs must be >= 1".to_string(),
        ));
    }

    if config.min_delay_secs > config.max_delay_secs {
        return Err(ConfigError::Validation(format!(
            "min_delay_secs ({}) cannot exceed max_delay_secs ({})",
            config.min_delay_secs, config.max_delay_secs
        )));
    }

    Ok(())
}

/// Validates credential pool configuration
fn validate_credentials_config(config: &CredentialsConfig) -> Result<(), ConfigError> {
    if config.env_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "env_prefix cannot be empty".to_string(),
        ));
    }

    if config.cooldown_secs < 1 {
        return Err(ConfigError::Validation(
            "cooldown_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates summarizer configuration
fn validate_summarizer_config(config: &SummarizerConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.endpoint, "summarizer endpoint")?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if !config.strip_prefix.is_empty() && !config.strip_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "strip_prefix must start with '/', got '{}'",
            config.strip_prefix
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates that a string is an absolute HTTP(S) URL
fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            what, raw
        )));
    }

    Ok(())
}

/// Validates a URL glob pattern
fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "URL pattern cannot be empty".to_string(),
        ));
    }

    if pattern.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPattern(format!(
            "URL pattern '{}' cannot contain whitespace",
            pattern
        )));
    }

    Ok(())
}
