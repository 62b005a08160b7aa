use crate::config::types::{Config, CrawlerConfig, RenderConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent workers, each of which holds one browser tab
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_render_config(&config.render)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.max_empty_checks < 1 {
        return Err(ConfigError::Validation(format!(
            "max_empty_checks must be >= 1, got {}",
            config.max_empty_checks
        )));
    }

    if config.idle_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "idle_interval_ms must be >= 1".to_string(),
        ));
    }

    // An empty start URL is allowed in the file; the CLI supplies it
    if !config.start_url.is_empty() {
        validate_start_url(&config.start_url)?;
    }

    Ok(())
}

/// Validates render configuration
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.page_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_ms must be >= 1000ms, got {}ms",
            config.page_timeout_ms
        )));
    }

    if let Some(path) = &config.chrome_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates a start URL, accepting bare domains the way the frontier does
fn validate_start_url(raw: &str) -> Result<(), ConfigError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else if lower.contains("://") {
        return Err(ConfigError::InvalidUrl(format!(
            "start URL '{}' must use http or https",
            raw
        )));
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", raw, e)))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidUrl(format!(
            "start URL '{}' has no host",
            raw
        ))),
    }
}
