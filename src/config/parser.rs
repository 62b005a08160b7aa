use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitepdf::config::load_config;
///
/// let config = load_config(Path::new("sitepdf.toml")).unwrap();
/// println!("Workers: {}", config.crawler.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;

    validate(&config)?;

    Ok(config)
}

/// Output directory used when none is configured
///
/// `example.com` maps to `results/example-com-pdfs`. A port separator is
/// replaced as well so the name stays a single path component.
pub fn default_output_dir(base_domain: &str) -> PathBuf {
    let slug: String = base_domain
        .chars()
        .map(|c| if c == '.' || c == ':' { '-' } else { c })
        .collect();
    Path::new("results").join(format!("{}-pdfs", slug))
}

impl Config {
    /// Builds a default configuration crawling from `start_url`
    pub fn for_start_url(start_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.crawler.start_url = start_url.into();
        config
    }

    /// Sets the per-request delay from a number of seconds
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::Validation)` - The value is negative or not finite
    pub fn set_delay_seconds(&mut self, seconds: f64) -> Result<(), ConfigError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ConfigError::Validation(format!(
                "delay must be a non-negative number of seconds, got {}",
                seconds
            )));
        }
        self.crawler.delay_ms = (seconds * 1000.0).round() as u64;
        Ok(())
    }

    /// Resolves the output directory, deriving it from the domain if unset
    pub fn output_dir(&self, base_domain: &str) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| default_output_dir(base_domain))
    }

    /// Runs the validation pass after CLI overrides were applied
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self)
    }
}
