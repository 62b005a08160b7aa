//! Output module for progress reporting and crawl summaries
//!
//! This module handles:
//! - Aggregating per-URL outcomes and errors while workers run
//! - Printing the end-of-run summary
//! - Exporting the summary as markdown

mod markdown;
mod reporter;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use reporter::{ProgressCounts, ProgressReporter};
pub use summary::CrawlSummary;
