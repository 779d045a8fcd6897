use crate::config::types::{Config, ScrapeConfig, ServerConfig, SourceConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_scrape_config(&config.scrape)?;
    validate_storage_config(&config.storage)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates source site configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if config.listing_path.is_empty() {
        return Err(ConfigError::Validation(
            "listing-path cannot be empty".to_string(),
        ));
    }

    // The listing path must resolve against the base URL
    base.join(&config.listing_path)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing-path: {}", e)))?;

    if !config.audio_url_template.contains("{id}") {
        return Err(ConfigError::Validation(
            "audio-url-template must contain the '{id}' placeholder".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scrape behavior configuration
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.downloads_dir.is_empty() {
        return Err(ConfigError::Validation(
            "downloads-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates read-surface configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.per_page < 1 || config.per_page > 500 {
        return Err(ConfigError::Validation(format!(
            "per-page must be between 1 and 500, got {}",
            config.per_page
        )));
    }

    Ok(())
}
