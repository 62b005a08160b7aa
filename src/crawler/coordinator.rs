//! Crawler coordinator - builds the shared crawl context and runs it
//!
//! This module wires the pieces of one crawl together:
//! - The frontier seeded from the start URL
//! - The artifact namer over the output directory
//! - The progress reporter
//! - The page renderer and the worker pool
//!
//! and turns the end state into a `CrawlSummary`.

use crate::artifact::ArtifactNamer;
use crate::config::Config;
use crate::crawler::frontier::Frontier;
use crate::crawler::renderer::PageRenderer;
use crate::crawler::scheduler::{Scheduler, SchedulerSettings};
use crate::engine::RenderEngine;
use crate::output::{generate_markdown_summary, CrawlSummary, ProgressReporter};
use crate::SitePdfError;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns everything one crawl run shares between workers
pub struct Coordinator<E: RenderEngine> {
    config: Config,
    frontier: Arc<Frontier>,
    reporter: Arc<ProgressReporter>,
    scheduler: Arc<Scheduler<E>>,
    output_dir: PathBuf,
}

impl<E: RenderEngine> Coordinator<E> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration, with CLI overrides applied
    /// * `engine` - The render engine shared by all workers
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SitePdfError)` - Invalid configuration, start URL or output directory
    pub fn new(config: Config, engine: Arc<E>) -> Result<Self, SitePdfError> {
        config.validate()?;

        let frontier = Arc::new(Frontier::new(&config.crawler.start_url)?);
        let output_dir = config.output_dir(frontier.base_domain());
        let namer = Arc::new(ArtifactNamer::new(&output_dir)?);
        let reporter = Arc::new(ProgressReporter::new());

        let renderer = Arc::new(PageRenderer::new(
            engine,
            Arc::clone(&frontier),
            namer,
            Arc::clone(&reporter),
            config.crawler.exists_mode,
        ));

        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&frontier),
            renderer,
            Arc::clone(&reporter),
            SchedulerSettings::from(&config.crawler),
        ));

        Ok(Self {
            config,
            frontier,
            reporter,
            scheduler,
            output_dir,
        })
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn reporter(&self) -> &Arc<ProgressReporter> {
        &self.reporter
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs the crawl until the frontier drains or `cancel` fires
    ///
    /// Cancellation is not an error: the returned summary is marked as
    /// interrupted and covers the pages completed so far.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlSummary, SitePdfError> {
        let started_at = Local::now();
        tracing::info!(
            "Crawling {} (domain {}) into {} [mode: {}]",
            self.frontier.start_url(),
            self.frontier.base_domain(),
            self.output_dir.display(),
            self.config.crawler.exists_mode
        );

        let interrupted = match Arc::clone(&self.scheduler).run(cancel).await {
            Ok(()) => false,
            Err(e) if e.is_cancelled() => true,
            Err(e) => return Err(e),
        };

        let summary = CrawlSummary {
            start_url: self.frontier.start_url().to_string(),
            base_domain: self.frontier.base_domain().to_string(),
            output_dir: self.output_dir.clone(),
            started_at,
            finished_at: Local::now(),
            interrupted,
            urls_visited: self.frontier.visited_count(),
            urls_queued: self.frontier.queue_size(),
            urls_processed: self.frontier.processed_count(),
            counts: self.reporter.summary(),
        };

        if let Some(path) = &self.config.output.summary_path {
            match generate_markdown_summary(&summary, path) {
                Ok(()) => tracing::info!("Wrote summary to {}", path.display()),
                Err(e) => tracing::warn!("Failed to write summary {}: {}", path.display(), e),
            }
        }

        Ok(summary)
    }
}

/// Builds a coordinator and runs one crawl
pub async fn run_crawl<E: RenderEngine>(
    config: Config,
    engine: Arc<E>,
    cancel: CancellationToken,
) -> Result<CrawlSummary, SitePdfError> {
    Coordinator::new(config, engine)?.run(cancel).await
}
