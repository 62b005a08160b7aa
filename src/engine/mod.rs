//! Render engine abstraction
//!
//! The crawler never talks to a browser directly. Everything it needs from a
//! page goes through [`RenderEngine`], which lets the Chromium engine be
//! swapped for an in-process fake in tests.

mod chrome;
mod header;
mod links;

use async_trait::async_trait;
use thiserror::Error;

pub use chrome::ChromeEngine;
pub use header::{escape_html, HeaderMeta, PRODUCER};
pub use links::{extract_anchor_hrefs, extract_resolved_links, extract_title};

/// Errors reported by a render engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to load {url}: {message}")]
    Load { url: String, message: String },

    #[error("Timed out loading {url}")]
    Timeout { url: String },

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Failed to render {url}: {message}")]
    Render { url: String, message: String },

    #[error("Browser is shut down")]
    Closed,
}

/// Browser automation used to load, inspect and export pages
///
/// Implementations own their page-load timeout; a timeout is reported as a
/// load failure. Every handle returned by `load_page` is passed to `close`
/// exactly once by the caller. A `load_page` future dropped before it
/// completes must not leave a page open.
#[async_trait]
pub trait RenderEngine: Send + Sync + 'static {
    /// Handle to one loaded page
    type Page: Send + Sync;

    /// Navigates to `url` and waits for the load to complete
    async fn load_page(&self, url: &str) -> Result<Self::Page, EngineError>;

    /// Absolute URLs of the page's followable anchors
    ///
    /// Hrefs are resolved against the document's final URL (after redirects)
    /// and its `<base href>`. `requested_url` is the URL passed to
    /// `load_page`, used only when the engine cannot report the document URL.
    async fn extract_links(
        &self,
        page: &Self::Page,
        requested_url: &str,
    ) -> Result<Vec<String>, EngineError>;

    /// Document title; empty when the page has none
    async fn title(&self, page: &Self::Page) -> Result<String, EngineError>;

    /// Rendered document content used for change detection
    async fn content(&self, page: &Self::Page) -> Result<String, EngineError>;

    /// Exports the page as PDF bytes with the given header
    async fn render(&self, page: &Self::Page, header: &HeaderMeta)
        -> Result<Vec<u8>, EngineError>;

    /// Releases the page handle; failures are logged, not returned
    async fn close(&self, page: Self::Page);

    /// Releases the engine itself
    async fn shutdown(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
