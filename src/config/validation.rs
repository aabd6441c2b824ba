use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::url::validate_tree_root;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_ignore_ids(&config.ignore.ids)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_tree_root(&config.tree_root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid tree-root: {}", e)))?;

    if config.root_id.trim().is_empty() {
        return Err(ConfigError::Validation("root-id cannot be empty".to_string()));
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be >= 1, got {}",
            config.max_depth
        )));
    }

    if config.retry_delay_ms > config.max_retry_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry-delay-ms ({}) cannot exceed max-retry-delay-ms ({})",
            config.retry_delay_ms, config.max_retry_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "progress-interval must be >= 1, got {}",
            config.progress_interval
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
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

    validate_extension(&config.extension)
}

/// Extension must be a plain suffix like `xml`
fn validate_extension(extension: &str) -> Result<(), ConfigError> {
    let extension = extension.strip_prefix('.').unwrap_or(extension);

    if extension.is_empty() {
        return Err(ConfigError::Validation(
            "output extension cannot be empty".to_string(),
        ));
    }

    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "output extension must be alphanumeric, got '{}'",
            extension
        )));
    }

    Ok(())
}

fn validate_ignore_ids(ids: &[String]) -> Result<(), ConfigError> {
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "ignore ids cannot be empty strings".to_string(),
        ));
    }
    Ok(())
}
