//! Artifact naming, versioning and content hashing
//!
//! # Components
//!
//! - `ArtifactNamer`: file names from page title and URL, unique within a run
//! - `ExistsMode`: what to do when an artifact is already on disk
//! - `hash`: SHA-256 of page content and its owning URL, stored in `<name>.sha256` sidecars

pub mod hash;
mod mode;
mod namer;

use std::path::PathBuf;
use thiserror::Error;

pub use hash::{content_hash, read_sidecar, stage_sidecar, write_sidecar, Sidecar};
pub use mode::ExistsMode;
pub use namer::{
    clean_title, clean_url_segment, url_segment, ArtifactNamer, ARTIFACT_EXTENSION,
    HASH_EXTENSION,
};

/// Errors writing artifacts to disk
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to move artifact into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}
