use crate::artifact::ExistsMode;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for sitepdf
///
/// Every table and key is optional in the TOML file; missing values fall back
/// to the defaults below. CLI flags are applied on top of the loaded file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    pub render: RenderConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Page the crawl starts from; its host fixes the crawl domain
    pub start_url: String,

    /// Number of concurrent workers
    pub workers: usize,

    /// Pause after each processed page, per worker (milliseconds)
    pub delay_ms: u64,

    /// What to do when a page's artifact already exists
    pub exists_mode: ExistsMode,

    /// When idle workers give up
    pub termination: TerminationPolicy,

    /// Consecutive empty claims before a worker exits (`empty-checks` policy)
    pub max_empty_checks: u32,

    /// Idle wait between empty claims (milliseconds)
    pub idle_interval_ms: u64,

    /// How long workers get to stop after cancellation before being aborted (milliseconds)
    pub shutdown_grace_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            workers: 5,
            delay_ms: 500,
            exists_mode: ExistsMode::default(),
            termination: TerminationPolicy::default(),
            max_empty_checks: 10,
            idle_interval_ms: 200,
            shutdown_grace_ms: 5000,
        }
    }
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Rule deciding when a worker with nothing to claim exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationPolicy {
    /// Exit once the queue is empty and no other worker holds a claim
    #[default]
    Quiescence,

    /// Exit after a fixed number of consecutive empty claims
    EmptyChecks,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the PDFs are written to; derived from the domain when unset
    pub directory: Option<PathBuf>,

    /// Path to the markdown summary file, if one should be written
    pub summary_path: Option<PathBuf>,
}

/// Browser engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Upper bound on navigation plus load completion (milliseconds)
    pub page_timeout_ms: u64,

    /// Chromium executable; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_timeout_ms: 30_000,
            chrome_path: None,
        }
    }
}

impl RenderConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }
}
