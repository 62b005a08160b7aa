use super::{extract_resolved_links, extract_title, EngineError, HeaderMeta, RenderEngine};
use crate::config::RenderConfig;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// A4 in inches
const PAPER_WIDTH_IN: f64 = 8.27;
const PAPER_HEIGHT_IN: f64 = 11.69;

/// 3cm top margin leaves room for the two-line header
const MARGIN_TOP_IN: f64 = 3.0 / 2.54;
const MARGIN_IN: f64 = 1.0 / 2.54;

/// Headless Chromium driven over the DevTools protocol
pub struct ChromeEngine {
    browser: RwLock<Option<Browser>>,
    handler: JoinHandle<()>,
    page_timeout: Duration,
}

impl ChromeEngine {
    /// Launches a headless browser
    ///
    /// # Returns
    ///
    /// * `Ok(ChromeEngine)` - Browser is running and its event loop is spawned
    /// * `Err(EngineError::Launch)` - No usable Chromium or the launch failed
    pub async fn launch(config: &RenderConfig) -> Result<Self, EngineError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(config.page_timeout());
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(EngineError::Launch)?;

        let (browser, mut events) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser event loop error: {}", e);
                }
            }
            tracing::debug!("Browser event loop ended");
        });

        tracing::info!("Launched headless browser");

        Ok(Self {
            browser: RwLock::new(Some(browser)),
            handler,
            page_timeout: config.page_timeout(),
        })
    }

    async fn navigate(&self, url: &str) -> Result<Page, EngineError> {
        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or(EngineError::Closed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Load {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let tab = OpenTab::new(page);

        let loaded = async {
            tab.page().goto(url).await?;
            tab.page().wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        let result = match tokio::time::timeout(self.page_timeout, loaded).await {
            Ok(Ok(())) => return Ok(tab.keep()),
            Ok(Err(e)) => EngineError::Load {
                url: url.to_string(),
                message: e.to_string(),
            },
            Err(_) => EngineError::Timeout {
                url: url.to_string(),
            },
        };

        self.close(tab.keep()).await;
        Err(result)
    }
}

/// Tab opened during navigation, closed in the background if dropped
///
/// Cancelling `load_page` drops the navigation future between `new_page` and
/// the return; the tab would otherwise stay open in the browser.
struct OpenTab {
    page: Page,
    armed: bool,
}

impl OpenTab {
    fn new(page: Page) -> Self {
        Self { page, armed: true }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    /// Hands the page to the caller, who becomes responsible for closing it
    fn keep(mut self) -> Page {
        self.armed = false;
        self.page.clone()
    }
}

impl Drop for OpenTab {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let page = self.page.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::debug!("Failed to close abandoned tab: {}", e);
                    }
                });
            }
            Err(_) => tracing::debug!("No runtime left to close abandoned tab"),
        }
    }
}

#[async_trait]
impl RenderEngine for ChromeEngine {
    type Page = Page;

    async fn load_page(&self, url: &str) -> Result<Page, EngineError> {
        self.navigate(url).await
    }

    async fn extract_links(
        &self,
        page: &Page,
        requested_url: &str,
    ) -> Result<Vec<String>, EngineError> {
        let html = page
            .content()
            .await
            .map_err(|e| EngineError::Content(format!("{}: {}", requested_url, e)))?;

        // Redirects move the document away from the requested URL
        let document_url = match page.url().await {
            Ok(Some(url)) if url != "about:blank" => url,
            Ok(_) => requested_url.to_string(),
            Err(e) => {
                tracing::debug!("Could not read document URL of {}: {}", requested_url, e);
                requested_url.to_string()
            }
        };

        Ok(extract_resolved_links(&html, &document_url))
    }

    async fn title(&self, page: &Page) -> Result<String, EngineError> {
        match page.get_title().await {
            Ok(Some(title)) => Ok(title.trim().to_string()),
            Ok(None) => Ok(String::new()),
            Err(e) => {
                tracing::debug!("get_title failed, falling back to DOM: {}", e);
                let html = self.content(page).await?;
                Ok(extract_title(&html).unwrap_or_default())
            }
        }
    }

    async fn content(&self, page: &Page) -> Result<String, EngineError> {
        page.content()
            .await
            .map_err(|e| EngineError::Content(e.to_string()))
    }

    async fn render(&self, page: &Page, header: &HeaderMeta) -> Result<Vec<u8>, EngineError> {
        let params = PrintToPdfParams {
            display_header_footer: Some(true),
            print_background: Some(true),
            header_template: Some(header.template()),
            footer_template: Some(String::from("<div></div>")),
            paper_width: Some(PAPER_WIDTH_IN),
            paper_height: Some(PAPER_HEIGHT_IN),
            margin_top: Some(MARGIN_TOP_IN),
            margin_bottom: Some(MARGIN_IN),
            margin_left: Some(MARGIN_IN),
            margin_right: Some(MARGIN_IN),
            ..Default::default()
        };

        page.pdf(params).await.map_err(|e| EngineError::Render {
            url: header.url.clone(),
            message: e.to_string(),
        })
    }

    async fn close(&self, page: Page) {
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page: {}", e);
        }
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        let mut guard = self.browser.write().await;
        if let Some(mut browser) = guard.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser cleanly: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        tracing::info!("Browser shut down");
        Ok(())
    }
}
