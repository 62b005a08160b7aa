/// URL lifecycle definitions for tracking crawl progress
///
/// Every URL the frontier has seen is in exactly one of these states.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// URL is in the queue waiting to be claimed
    Discovered,

    /// URL has been claimed by a worker
    Visited,

    // ===== Terminal States =====
    /// An artifact was produced and committed for this URL
    Processed,

    /// Processing ended without a committed artifact (failed, skipped, unchanged, raced)
    Abandoned,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Abandoned)
    }

    /// Returns true if the URL may still produce an artifact
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovered | Self::Visited)
    }

    /// Returns true if the lifecycle allows moving from `self` to `next`
    ///
    /// States only move forward: `Discovered -> Visited -> Processed | Abandoned`.
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Visited)
                | (Self::Visited, Self::Processed)
                | (Self::Visited, Self::Abandoned)
        )
    }

    /// Short lowercase label for logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Visited => "visited",
            Self::Processed => "processed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
