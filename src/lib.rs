//! sitepdf: crawl one website and keep a versioned PDF of every page
//!
//! This crate walks every page reachable inside a single domain, renders each one
//! through a browser engine and writes a PDF per page, skipping, updating or
//! appending versions based on a content hash of the loaded page.

pub mod artifact;
pub mod config;
pub mod crawler;
pub mod engine;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for sitepdf operations
#[derive(Debug, Error)]
pub enum SitePdfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render engine error: {0}")]
    Engine(#[from] engine::EngineError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] artifact::ArtifactError),

    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

impl SitePdfError {
    /// Returns true if this error is the run-level cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
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
}

/// Result type alias for sitepdf operations
pub type Result<T> = std::result::Result<T, SitePdfError>;

// Re-export commonly used types
pub use artifact::{ArtifactNamer, ExistsMode};
pub use config::Config;
pub use crawler::{Coordinator, Frontier};
pub use engine::RenderEngine;
pub use output::{CrawlSummary, ProgressReporter};
pub use state::{Outcome, UrlState};
pub use url::{extract_domain, normalize_url};
