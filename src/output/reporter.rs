use crate::state::Outcome;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome counters and error log
///
/// `processed` always equals `created + updated + skipped + failed`;
/// `unchanged` and `already_processed` are sub-counts of `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressCounts {
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub unchanged: u64,
    pub already_processed: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

impl ProgressCounts {
    /// Checks the counter identity
    pub fn is_consistent(&self) -> bool {
        self.processed == self.created + self.updated + self.skipped + self.failed
            && self.unchanged + self.already_processed <= self.skipped
    }

    fn record(&mut self, outcome: Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Unchanged => {
                self.skipped += 1;
                self.unchanged += 1;
            }
            Outcome::AlreadyProcessed => {
                self.skipped += 1;
                self.already_processed += 1;
            }
            Outcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Default)]
struct ReporterState {
    counts: ProgressCounts,
    started: u64,
    total: u64,
}

impl ReporterState {
    fn progress(&self) -> String {
        if self.total == 0 {
            format!("[{}/?]", self.started)
        } else {
            format!("[{}/{}]", self.started, self.total)
        }
    }
}

/// Shared progress and error aggregation for all workers
///
/// Every update happens under one lock, so any snapshot satisfies the
/// counter identity.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the progress denominator (visited plus queued URLs)
    pub fn set_total(&self, total: usize) {
        self.state().total = total as u64;
    }

    /// Announces that a worker started on a URL
    pub fn start_processing(&self, url: &str, worker_id: usize, active: usize) {
        let line = {
            let mut state = self.state();
            state.started += 1;
            format!(
                "{} [Worker-{}] (Active: {}) Processing: {}",
                state.progress(),
                worker_id,
                active,
                url
            )
        };
        tracing::info!("{}", line);
    }

    /// Records how a URL ended
    ///
    /// `detail` is appended to the progress line and, for failures, to the
    /// error log entry.
    pub fn finish_processing(
        &self,
        url: &str,
        outcome: Outcome,
        detail: Option<&str>,
        worker_id: usize,
        active: usize,
    ) {
        let mut line = {
            let state = self.state();
            format!(
                "{} [Worker-{}] (Active: {}) {}: {}",
                state.progress(),
                worker_id,
                active,
                outcome.action(),
                url
            )
        };
        if let Some(detail) = detail {
            line.push_str(" - ");
            line.push_str(detail);
        }

        {
            let mut state = self.state();
            state.counts.record(outcome);
            if outcome.is_error() {
                state.counts.errors.push(line.clone());
            }
        }

        if outcome.is_error() {
            tracing::warn!("{}", line);
        } else {
            tracing::info!("{}", line);
        }
    }

    /// Adds an error log entry without recording an outcome
    pub fn log_error(&self, url: &str, message: &str) {
        let entry = format!("Error processing {}: {}", url, message);
        tracing::error!("{}", entry);
        self.state().counts.errors.push(entry);
    }

    /// Snapshot of the counters and the error log
    pub fn summary(&self) -> ProgressCounts {
        self.state().counts.clone()
    }

    /// Number of URLs announced through `start_processing`
    pub fn started(&self) -> u64 {
        self.state().started
    }

    pub fn total(&self) -> u64 {
        self.state().total
    }
}
