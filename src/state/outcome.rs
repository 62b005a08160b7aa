use std::fmt;

/// Final result of processing one claimed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A new artifact was written
    Created,

    /// An existing artifact was replaced because its content changed
    Updated,

    /// The artifact already existed and the exists-mode said not to touch it
    Skipped,

    /// The rendered content hash matched the stored one
    Unchanged,

    /// Loading, rendering or persisting failed
    Failed,

    /// Another worker committed this URL first
    AlreadyProcessed,
}

impl Outcome {
    /// Returns true if this outcome committed an artifact
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }

    /// Returns true if this outcome is counted under `skipped`
    pub fn counts_as_skipped(&self) -> bool {
        matches!(self, Self::Skipped | Self::Unchanged | Self::AlreadyProcessed)
    }

    /// Returns true if this outcome goes into the error log
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Label used in progress lines
    pub fn action(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Skipped => "Skipped",
            Self::Unchanged => "Unchanged",
            Self::Failed => "Failed",
            Self::AlreadyProcessed => "Already processed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
            Self::AlreadyProcessed => "already-processed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
