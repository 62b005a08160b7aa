//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: lifecycle of a single URL (discovered, visited, processed, abandoned)
//! - `Outcome`: how the processing of a claimed URL ended

mod outcome;
mod url_state;

// Re-export main types
pub use outcome::Outcome;
pub use url_state::UrlState;
