//! URL frontier for a single-domain crawl
//!
//! The frontier owns the FIFO queue of discovered URLs together with the
//! queued/visited/processed bookkeeping that keeps every URL on a one-way
//! lifecycle. All mutation happens under one mutex and no lock is ever held
//! across an `.await`, so claim and commit are short synchronous critical sections.

use crate::state::UrlState;
use crate::url::{extract_domain, is_same_domain, normalize_url, resolve_link};
use crate::SitePdfError;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Mutable frontier bookkeeping, guarded by `Frontier::inner`
#[derive(Debug, Default)]
struct FrontierState {
    /// URLs waiting to be claimed, in discovery order
    queue: VecDeque<String>,

    /// Mirror of `queue` for O(1) duplicate rejection
    queued: HashSet<String>,

    /// URLs that have been claimed by a worker
    visited: HashSet<String>,

    /// URLs with a committed artifact
    processed: HashSet<String>,

    /// Visited URLs that ended without an artifact
    abandoned: HashSet<String>,

    /// Claims handed out and not yet released
    in_flight: usize,
}

/// Result of a claim attempt
#[derive(Debug)]
pub enum ClaimResult {
    /// A URL was claimed; dropping the guard releases the in-flight slot
    Claimed(Claim),

    /// The queue was empty
    Empty {
        /// True when no other claim is in flight either, so no new URL can appear
        quiescent: bool,
    },
}

/// Ownership of one claimed URL
///
/// The frontier counts the claim as in flight until this guard is dropped,
/// which covers every exit path of a worker including cancellation.
#[derive(Debug)]
pub struct Claim {
    url: String,
    frontier: Arc<Frontier>,
}

impl Claim {
    /// The claimed, normalized URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

/// Result of a commit attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Commit<T> {
    /// The URL was marked processed and the finalize step's value is returned
    Committed(T),

    /// Another worker committed the URL first; finalize was not run
    AlreadyProcessed,
}

/// Crawl frontier confined to the domain of the start URL
#[derive(Debug)]
pub struct Frontier {
    start_url: String,
    base_domain: String,
    inner: Mutex<FrontierState>,
    changed: Notify,
}

impl Frontier {
    /// Creates a frontier seeded with the normalized start URL
    ///
    /// The base domain is taken from the start URL and never changes.
    ///
    /// # Returns
    ///
    /// * `Ok(Frontier)` - Frontier with the start URL queued
    /// * `Err(SitePdfError::InvalidStartUrl)` - The start URL has no host
    pub fn new(start_url: &str) -> Result<Self, SitePdfError> {
        let start_url = normalize_url(start_url);
        let base_domain = extract_domain(&start_url)
            .ok_or_else(|| SitePdfError::InvalidStartUrl(start_url.clone()))?;

        let mut state = FrontierState::default();
        state.queue.push_back(start_url.clone());
        state.queued.insert(start_url.clone());

        Ok(Self {
            start_url,
            base_domain,
            inner: Mutex::new(state),
            changed: Notify::new(),
        })
    }

    /// Locks the shared state
    ///
    /// A panic elsewhere cannot leave the sets half-updated (every critical
    /// section is a handful of infallible set operations), so a poisoned lock
    /// is recovered instead of propagated.
    fn state(&self) -> MutexGuard<'_, FrontierState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The normalized start URL
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// The domain every crawled URL must belong to
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Checks whether a URL belongs to the crawl domain (case-insensitive)
    pub fn is_same_domain(&self, url: &str) -> bool {
        is_same_domain(url, &self.base_domain)
    }

    /// Resolves a raw link against the page it was found on and filters it
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The normalized same-domain URL
    /// * `None` - The link is cross-domain, not http(s), or unresolvable
    pub fn resolve_and_filter(&self, raw: &str, base_url: &str) -> Option<String> {
        let absolute = resolve_link(raw, base_url)?;
        let normalized = normalize_url(&absolute);
        if self.is_same_domain(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }

    /// Adds a URL to the tail of the queue
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and has been queued
    /// * `false` - The URL is cross-domain or already queued, visited or processed
    pub fn enqueue(&self, url: &str) -> bool {
        let normalized = normalize_url(url);
        if !self.is_same_domain(&normalized) {
            return false;
        }

        {
            let mut state = self.state();
            if state.visited.contains(&normalized)
                || state.processed.contains(&normalized)
                || state.queued.contains(&normalized)
            {
                return false;
            }

            state.queued.insert(normalized.clone());
            state.queue.push_back(normalized);
        }

        self.changed.notify_waiters();
        true
    }

    /// Pops the head of the queue and marks it visited
    ///
    /// The emptiness check, the pop and the visited insert happen under one
    /// lock, so concurrent callers never receive the same URL.
    pub fn dequeue(&self) -> Option<String> {
        let mut state = self.state();
        Self::pop_locked(&mut state)
    }

    fn pop_locked(state: &mut FrontierState) -> Option<String> {
        let url = state.queue.pop_front()?;
        state.queued.remove(&url);
        state.visited.insert(url.clone());
        Some(url)
    }

    /// Dequeues a URL and registers it as in flight
    ///
    /// Unlike [`Frontier::dequeue`], the returned guard keeps the frontier from
    /// reporting quiescence until the claim is dropped.
    pub fn claim(self: &Arc<Self>) -> ClaimResult {
        let mut state = self.state();
        match Self::pop_locked(&mut state) {
            Some(url) => {
                state.in_flight += 1;
                ClaimResult::Claimed(Claim {
                    url,
                    frontier: Arc::clone(self),
                })
            }
            None => ClaimResult::Empty {
                quiescent: state.in_flight == 0,
            },
        }
    }

    fn release(&self) {
        {
            let mut state = self.state();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }

    /// Waits until a URL is enqueued or a claim is released
    ///
    /// Wakeups can be missed between a check and this call; callers pair it
    /// with a timeout.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    /// Checks whether the URL has a committed artifact
    pub fn is_processed(&self, url: &str) -> bool {
        let normalized = normalize_url(url);
        self.state().processed.contains(&normalized)
    }

    /// Marks the URL as processed
    ///
    /// # Returns
    ///
    /// * `true` - The URL was not processed before
    /// * `false` - The URL was already processed
    pub fn mark_processed(&self, url: &str) -> bool {
        let normalized = normalize_url(url);
        let mut state = self.state();
        state.abandoned.remove(&normalized);
        state.processed.insert(normalized)
    }

    /// Atomically re-checks the processed set, finalizes and marks processed
    ///
    /// `finalize` runs inside the critical section and only when the URL is not
    /// processed yet. If it fails, the URL is left unprocessed and the error is
    /// returned, so a processed mark always has its artifact behind it.
    pub fn commit<T, E>(
        &self,
        url: &str,
        finalize: impl FnOnce() -> Result<T, E>,
    ) -> Result<Commit<T>, E> {
        let normalized = normalize_url(url);
        let mut state = self.state();

        if state.processed.contains(&normalized) {
            return Ok(Commit::AlreadyProcessed);
        }

        let value = finalize()?;
        state.abandoned.remove(&normalized);
        state.processed.insert(normalized);
        Ok(Commit::Committed(value))
    }

    /// Records that a visited URL ended without an artifact
    pub fn mark_abandoned(&self, url: &str) {
        let normalized = normalize_url(url);
        let mut state = self.state();
        if !state.processed.contains(&normalized) {
            state.abandoned.insert(normalized);
        }
    }

    /// Returns the lifecycle state of a URL, or `None` if it was never seen
    pub fn url_state(&self, url: &str) -> Option<UrlState> {
        let normalized = normalize_url(url);
        let state = self.state();
        if state.processed.contains(&normalized) {
            Some(UrlState::Processed)
        } else if state.abandoned.contains(&normalized) {
            Some(UrlState::Abandoned)
        } else if state.visited.contains(&normalized) {
            Some(UrlState::Visited)
        } else if state.queued.contains(&normalized) {
            Some(UrlState::Discovered)
        } else {
            None
        }
    }

    /// Number of URLs waiting in the queue
    pub fn queue_size(&self) -> usize {
        self.state().queue.len()
    }

    /// Number of URLs ever claimed
    pub fn visited_count(&self) -> usize {
        self.state().visited.len()
    }

    /// Number of URLs with a committed artifact
    pub fn processed_count(&self) -> usize {
        self.state().processed.len()
    }

    /// Number of claims currently in flight
    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    /// Returns true if the queue is not empty
    pub fn has_more(&self) -> bool {
        !self.state().queue.is_empty()
    }

    /// Snapshot of the queue in discovery order
    pub fn queued_urls(&self) -> Vec<String> {
        self.state().queue.iter().cloned().collect()
    }
}
