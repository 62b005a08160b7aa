use super::hash::read_sidecar;
use super::ArtifactError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Extension of rendered artifacts
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// Extension of content hash sidecars
pub const HASH_EXTENSION: &str = "sha256";

const MAX_TITLE_LEN: usize = 50;
const MAX_SEGMENT_LEN: usize = 30;
const UNTITLED: &str = "Untitled";
const ROOT_SEGMENT: &str = "index";

/// Derives artifact names and paths inside one output directory
///
/// Every path handed out is reserved for one URL for the lifetime of the
/// namer, so two URLs with the same base name never share a file within a
/// run. Across runs, ownership comes from the URL recorded in each sidecar.
#[derive(Debug)]
pub struct ArtifactNamer {
    output_dir: PathBuf,
    reserved: Mutex<HashMap<PathBuf, String>>,
}

impl ArtifactNamer {
    /// Creates a namer, creating the output directory if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|source| ArtifactError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            output_dir,
            reserved: Mutex::new(HashMap::new()),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic name from title and URL, without any suffix
    pub fn base_name(&self, title: &str, url: &str) -> String {
        let title = clean_title(title);
        let segment = clean_url_segment(&url_segment(url));

        if segment.is_empty() || segment == ROOT_SEGMENT {
            title
        } else {
            format!("{}_{}", title, segment)
        }
    }

    /// Base name made unique against this run and the files already on disk
    ///
    /// Collisions get `_1`, `_2`, ... appended. The returned name never exists
    /// on disk and is reserved for `url` immediately, so concurrent callers
    /// rendering different URLs always receive distinct names.
    pub fn generate_unique_name(&self, title: &str, url: &str) -> String {
        let base = self.base_name(title, url);
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);

        let mut candidate = base.clone();
        let mut counter = 1u32;
        loop {
            let path = self.full_path(&candidate);
            let free = reserved.get(&path).map_or(true, |owner| owner == url) && !path.exists();
            if free {
                reserved.insert(path, url.to_string());
                return candidate;
            }
            candidate = format!("{}_{}", base, counter);
            counter += 1;
        }
    }

    /// Reserves `path` for `url` in this run
    ///
    /// Returns false if another URL already holds it.
    pub fn reserve(&self, path: &Path, url: &str) -> bool {
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        match reserved.get(path) {
            Some(owner) => owner == url,
            None => {
                reserved.insert(path.to_path_buf(), url.to_string());
                true
            }
        }
    }

    /// Latest artifact of `url`, reserved for it in this run
    pub fn claim_existing(&self, title: &str, url: &str) -> Option<PathBuf> {
        self.latest_version(title, url)
            .filter(|path| self.reserve(path, url))
    }

    /// `output_dir/<name>.pdf`
    pub fn full_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", name, ARTIFACT_EXTENSION))
    }

    /// Sidecar path holding the content hash of an artifact
    pub fn hash_path(&self, artifact_path: &Path) -> PathBuf {
        artifact_path.with_extension(HASH_EXTENSION)
    }

    /// Highest-numbered artifact on disk sharing the base name and owned by `url`
    ///
    /// `<stem>.pdf` counts as version 0 and `<stem>_N.pdf` as version N. A
    /// version belongs to `url` when its sidecar records that URL. When `url`
    /// owns no version, an unowned `<stem>.pdf` (no sidecar, or a sidecar
    /// without a URL) is returned so it can be adopted.
    pub fn latest_version(&self, title: &str, url: &str) -> Option<PathBuf> {
        let stem = self.base_name(title, url);
        let mut versions = self.versions(&stem);
        versions.sort_by_key(|(version, _)| std::cmp::Reverse(*version));

        let mut unowned_base = None;
        for (version, path) in versions {
            match read_sidecar(&self.hash_path(&path)) {
                Some(sidecar) if sidecar.is_owned_by(url) => return Some(path),
                Some(sidecar) if sidecar.url.is_some() => {}
                _ if version == 0 => unowned_base = Some(path),
                _ => {}
            }
        }
        unowned_base
    }

    /// Every `<stem>.pdf` / `<stem>_N.pdf` on disk with its version number
    fn versions(&self, stem: &str) -> Vec<(u32, PathBuf)> {
        let entries = match std::fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Could not list output directory {}: {}",
                    self.output_dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
                    return None;
                }
                let file_stem = path.file_stem()?.to_str()?;
                version_of(file_stem, stem).map(|version| (version, path))
            })
            .collect()
    }
}

/// Version number of `file_stem` relative to `stem`, if it is one of its versions
fn version_of(file_stem: &str, stem: &str) -> Option<u32> {
    if file_stem == stem {
        return Some(0);
    }
    let suffix = file_stem.strip_prefix(stem)?.strip_prefix('_')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Turns a page title into a filesystem-safe ASCII name
///
/// # Examples
///
/// ```
/// use sitepdf::artifact::clean_title;
///
/// assert_eq!(clean_title("  Hello, World!  "), "Hello_World");
/// assert_eq!(clean_title("Ça va?"), "Ca_va");
/// assert_eq!(clean_title("???"), "Untitled");
/// ```
pub fn clean_title(title: &str) -> String {
    let ascii = deunicode::deunicode(title.trim());

    let mut cleaned = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        let c = if c == ' ' { '_' } else { c };
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            continue;
        }
        if c == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(c);
    }

    cleaned.truncate(MAX_TITLE_LEN);
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Last non-empty path segment of a URL without its extension, `index` for the root
pub fn url_segment(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(url)
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .split_once('/')
            .map(|(_, path)| path.to_string())
            .unwrap_or_default(),
    };

    let last = path.split('/').filter(|s| !s.is_empty()).next_back();
    match last {
        Some(segment) => Path::new(segment)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(segment)
            .to_string(),
        None => ROOT_SEGMENT.to_string(),
    }
}

/// Lowercases a URL segment and keeps only word characters and hyphens
pub fn clean_url_segment(segment: &str) -> String {
    segment
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_SEGMENT_LEN)
        .collect()
}
