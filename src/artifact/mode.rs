use serde::Deserialize;
use std::fmt;

/// Policy applied when a page's artifact already exists on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExistsMode {
    /// Leave an existing artifact alone without rendering
    Skip,

    /// Re-render into the same file when the content hash changed
    #[default]
    Update,

    /// Add a new numbered version when the content hash changed
    Append,

    /// Always render into the base file
    #[serde(alias = "fresh")]
    #[value(alias = "fresh")]
    Overwrite,
}

impl ExistsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Update => "update",
            Self::Append => "append",
            Self::Overwrite => "overwrite",
        }
    }

    /// Returns true if this mode compares content hashes before rendering
    pub fn checks_content(&self) -> bool {
        matches!(self, Self::Update | Self::Append)
    }
}

impl fmt::Display for ExistsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
