use crate::config::types::{AgentConfig, Config, CrawlerConfig, NetworkConfig, ShellConfig};
use crate::url::parse_http_url;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_agent_config(&config.agent)?;
    validate_shell_config(&config.shell)?;
    validate_crawler_config(&config.crawler)?;
    validate_network_config(&config.network)?;

    if config.storage.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates agent identity and the store naming parts
fn validate_agent_config(config: &AgentConfig) -> Result<(), ConfigError> {
    validate_name_part("app_prefix", &config.app_prefix)?;
    validate_name_part("version", &config.version)?;

    let origin = parse_http_url(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.path() != "/" || origin.query().is_some() || origin.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "Origin '{}' must not carry a path, query or fragment",
            config.origin
        )));
    }

    Ok(())
}

/// Store names are `<prefix>-<version>`; both parts must be non-empty and free of
/// whitespace so the name round-trips through every backend unchanged
fn validate_name_part(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{} must not contain whitespace, got '{}'",
            field, value
        )));
    }

    Ok(())
}

/// Shell and fallback paths must be site-relative
fn validate_shell_config(config: &ShellConfig) -> Result<(), ConfigError> {
    for path in config.paths() {
        validate_site_path(path)?;
    }
    Ok(())
}

fn validate_site_path(path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "Shell path '{}' must start with '/'",
            path
        )));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_visited < 1 {
        return Err(ConfigError::Validation(format!(
            "max_visited must be >= 1, got {}",
            config.max_visited
        )));
    }

    validate_site_path(&config.marker_path)?;

    Ok(())
}

/// Validates network configuration
fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}
