//! Worker pool driving claimed URLs through the page renderer
//!
//! This module handles:
//! - Spawning a fixed number of workers on a `JoinSet`
//! - Claim gating via a semaphore
//! - The per-request delay and idle waiting
//! - Deciding when idle workers exit
//! - Pool-wide cancellation with a bounded grace period

use crate::config::{CrawlerConfig, TerminationPolicy};
use crate::crawler::frontier::{Claim, ClaimResult, Frontier};
use crate::crawler::renderer::{PageOutcome, PageRenderer};
use crate::engine::RenderEngine;
use crate::output::ProgressReporter;
use crate::SitePdfError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Worker pool settings, taken from the crawler configuration
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub workers: usize,
    pub delay: Duration,
    pub termination: TerminationPolicy,
    pub max_empty_checks: u32,
    pub idle_interval: Duration,
    pub shutdown_grace: Duration,
}

impl From<&CrawlerConfig> for SchedulerSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            delay: config.delay(),
            termination: config.termination,
            max_empty_checks: config.max_empty_checks.max(1),
            idle_interval: config.idle_interval(),
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

/// Where a worker is in its loop
#[derive(Debug)]
enum WorkerState {
    Claiming,
    Processing(Claim),
    IdleWait,
    Exited,
}

/// Counts workers currently inside the renderer
///
/// The count is decremented when the guard drops, including on panic and
/// cancellation.
struct ActiveGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ActiveGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }

    fn current(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fixed-size worker pool over a shared frontier
pub struct Scheduler<E: RenderEngine> {
    frontier: Arc<Frontier>,
    renderer: Arc<PageRenderer<E>>,
    reporter: Arc<ProgressReporter>,
    claim_gate: Semaphore,
    active: AtomicUsize,
    settings: SchedulerSettings,
}

impl<E: RenderEngine> Scheduler<E> {
    pub fn new(
        frontier: Arc<Frontier>,
        renderer: Arc<PageRenderer<E>>,
        reporter: Arc<ProgressReporter>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            claim_gate: Semaphore::new(settings.workers),
            active: AtomicUsize::new(0),
            frontier,
            renderer,
            reporter,
            settings,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Number of workers currently rendering a page
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Runs the pool until every worker has exited
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The frontier drained
    /// * `Err(SitePdfError::Cancelled)` - `cancel` fired; workers were stopped
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), SitePdfError> {
        tracing::info!(
            "Starting {} workers (termination: {:?})",
            self.settings.workers,
            self.settings.termination
        );

        let mut workers = JoinSet::new();
        for id in 1..=self.settings.workers {
            let scheduler = Arc::clone(&self);
            let cancel = cancel.clone();
            workers.spawn(async move { scheduler.worker(id, cancel).await });
        }

        let drained = tokio::select! {
            _ = drain(&mut workers) => true,
            _ = cancel.cancelled() => false,
        };

        if !drained {
            tracing::info!(
                "Cancellation requested, waiting up to {:?} for workers",
                self.settings.shutdown_grace
            );
            if tokio::time::timeout(self.settings.shutdown_grace, drain(&mut workers))
                .await
                .is_err()
            {
                tracing::warn!("Workers did not stop in time, aborting {}", workers.len());
                workers.abort_all();
                drain(&mut workers).await;
            }
        }

        if cancel.is_cancelled() {
            Err(SitePdfError::Cancelled)
        } else {
            tracing::info!("All workers finished");
            Ok(())
        }
    }

    async fn worker(&self, id: usize, cancel: CancellationToken) {
        let mut state = WorkerState::Claiming;
        let mut empty_checks = 0u32;

        loop {
            state = match state {
                WorkerState::Claiming => self.claim(id, &mut empty_checks, &cancel).await,
                WorkerState::Processing(claim) => {
                    self.process(id, claim, &cancel).await;
                    self.pause(&cancel).await
                }
                WorkerState::IdleWait => self.idle(&cancel).await,
                WorkerState::Exited => break,
            };
        }

        tracing::debug!("Worker-{} exited", id);
    }

    async fn claim(
        &self,
        id: usize,
        empty_checks: &mut u32,
        cancel: &CancellationToken,
    ) -> WorkerState {
        let permit = tokio::select! {
            _ = cancel.cancelled() => return WorkerState::Exited,
            permit = self.claim_gate.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return WorkerState::Exited,
            },
        };
        let claimed = self.frontier.claim();
        drop(permit);

        match claimed {
            ClaimResult::Claimed(claim) => {
                *empty_checks = 0;
                if self.frontier.is_processed(claim.url()) {
                    tracing::debug!("Worker-{} dropping processed {}", id, claim.url());
                    return WorkerState::Claiming;
                }
                WorkerState::Processing(claim)
            }
            ClaimResult::Empty { quiescent } => {
                *empty_checks += 1;
                if self.should_exit(quiescent, *empty_checks) {
                    tracing::debug!(
                        "Worker-{} found no work (quiescent: {}, empty checks: {})",
                        id,
                        quiescent,
                        empty_checks
                    );
                    WorkerState::Exited
                } else {
                    WorkerState::IdleWait
                }
            }
        }
    }

    fn should_exit(&self, quiescent: bool, empty_checks: u32) -> bool {
        match self.settings.termination {
            TerminationPolicy::Quiescence => quiescent,
            TerminationPolicy::EmptyChecks => empty_checks >= self.settings.max_empty_checks,
        }
    }

    async fn process(&self, id: usize, claim: Claim, cancel: &CancellationToken) {
        let url = claim.url().to_string();
        let active = ActiveGuard::enter(&self.active);
        self.reporter.start_processing(&url, id, active.current());

        let result = AssertUnwindSafe(self.renderer.process(&url, cancel))
            .catch_unwind()
            .await;

        let page = match result {
            Ok(Ok(page)) => page,
            Ok(Err(e)) if e.is_cancelled() => {
                tracing::debug!("Worker-{} cancelled while processing {}", id, url);
                self.frontier.mark_abandoned(&url);
                return;
            }
            Ok(Err(e)) => PageOutcome::failed(e.to_string()),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("Worker-{} panicked on {}: {}", id, url, message);
                PageOutcome::failed(format!("worker panicked: {}", message))
            }
        };

        if !page.outcome.is_committed() {
            self.frontier.mark_abandoned(&url);
        }
        self.reporter.finish_processing(
            &url,
            page.outcome,
            page.detail.as_deref(),
            id,
            active.current(),
        );

        drop(active);
        drop(claim);
    }

    /// Inter-request delay after processing
    async fn pause(&self, cancel: &CancellationToken) -> WorkerState {
        if cancel.is_cancelled() {
            return WorkerState::Exited;
        }
        if self.settings.delay.is_zero() {
            return WorkerState::Claiming;
        }

        tokio::select! {
            _ = cancel.cancelled() => WorkerState::Exited,
            _ = tokio::time::sleep(self.settings.delay) => WorkerState::Claiming,
        }
    }

    async fn idle(&self, cancel: &CancellationToken) -> WorkerState {
        tokio::select! {
            _ = cancel.cancelled() => WorkerState::Exited,
            _ = self.frontier.changed() => WorkerState::Claiming,
            _ = tokio::time::sleep(self.settings.idle_interval) => WorkerState::Claiming,
        }
    }
}

/// Waits for every task in the set, logging tasks that failed
async fn drain(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!("Worker task panicked: {}", e);
            } else if !e.is_cancelled() {
                tracing::warn!("Worker task failed: {}", e);
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
