//! Content hashing and hash sidecar files
//!
//! A sidecar `<name>.sha256` sits next to every artifact. Its first line is
//! the hex content hash, its second line the URL the artifact was rendered
//! from. Different URLs can map to the same base name, so lookups only trust
//! a sidecar whose URL matches.

use super::ArtifactError;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Lowercase hex SHA-256 of the page content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parsed contents of a hash sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    pub hash: String,

    /// Owning URL; `None` for sidecars holding only a hash
    pub url: Option<String>,
}

impl Sidecar {
    pub fn new(hash: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            url: Some(url.into()),
        }
    }

    fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        let hash = lines.next()?.to_string();
        let url = lines.next().map(str::to_string);
        Some(Self { hash, url })
    }

    fn to_text(&self) -> String {
        match &self.url {
            Some(url) => format!("{}\n{}\n", self.hash, url),
            None => format!("{}\n", self.hash),
        }
    }

    pub fn is_owned_by(&self, url: &str) -> bool {
        self.url.as_deref() == Some(url)
    }
}

/// Reads a hash sidecar
///
/// A missing, blank or unreadable sidecar yields `None`, which callers treat
/// as "content differs".
pub fn read_sidecar(hash_path: &Path) -> Option<Sidecar> {
    match std::fs::read_to_string(hash_path) {
        Ok(text) => Sidecar::parse(&text),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Could not read hash file {}: {}", hash_path.display(), e);
            }
            None
        }
    }
}

/// Writes a sidecar to a synced temporary file in `dir`
///
/// The caller moves it into place with [`NamedTempFile::persist`]; dropping
/// it instead deletes the file.
pub fn stage_sidecar(dir: &Path, sidecar: &Sidecar) -> Result<NamedTempFile, ArtifactError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(sidecar.to_text().as_bytes())?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Writes a sidecar through a temporary file and rename
pub fn write_sidecar(hash_path: &Path, sidecar: &Sidecar) -> Result<(), ArtifactError> {
    let dir = hash_path.parent().unwrap_or_else(|| Path::new("."));
    stage_sidecar(dir, sidecar)?.persist(hash_path)?;
    Ok(())
}
