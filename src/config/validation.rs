use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site scope configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.scheme != "http" && config.scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "scheme must be 'http' or 'https', got '{}'",
            config.scheme
        )));
    }

    if config.host.is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }

    let base = config
        .base_url()
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site '{}': {}", config.host, e)))?;
    if base.path() != "/" || base.query().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "host '{}' must not contain a path or query",
            config.host
        )));
    }

    for pattern in &config.extra_hosts {
        validate_host_pattern(pattern)?;
    }

    if config.allowed_prefixes.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_prefixes must contain at least one prefix".to_string(),
        ));
    }

    for prefix in &config.allowed_prefixes {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "allowed prefix '{}' must start with '/'",
                prefix
            )));
        }
    }

    if config.leaf_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "leaf_suffix cannot be empty".to_string(),
        ));
    }

    if !config.download_handler_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "download_handler_path must start with '/', got '{}'",
            config.download_handler_path
        )));
    }

    if config.download_id_param.is_empty() {
        return Err(ConfigError::Validation(
            "download_id_param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth and max_retries of 0 are meaningful (root only / no retries)

    if !config.root_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "root_path must start with '/', got '{}'",
            config.root_path
        )));
    }

    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max_items must be >= 1, got {}",
            config.max_items
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates HTTP transport configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.require_proxies && config.proxies.is_empty() {
        return Err(ConfigError::Validation(
            "at least one proxy is required (set require-proxies = false to connect directly)"
                .to_string(),
        ));
    }

    for proxy in &config.proxies {
        Url::parse(proxy).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e))
        })?;
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.entries_path.is_empty() {
        return Err(ConfigError::Validation(
            "entries_path cannot be empty".to_string(),
        ));
    }

    if !config.unknown_media_type.contains('/') {
        return Err(ConfigError::Validation(format!(
            "unknown_media_type must look like 'type/subtype', got '{}'",
            config.unknown_media_type
        )));
    }

    Ok(())
}

/// Validates a host pattern (supports a leading "*." wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is not a valid host name",
            domain
        )));
    }

    Ok(())
}
