//! Configuration module for sitepdf
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are layered on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use sitepdf::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitepdf.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, RenderConfig, TerminationPolicy};

// Re-export parser functions
pub use parser::{default_output_dir, load_config, parse_config};
