//! Per-page pipeline: load, discover links, apply the exists-mode policy,
//! render and commit

use crate::artifact::{
    content_hash, read_sidecar, stage_sidecar, ArtifactError, ArtifactNamer, ExistsMode, Sidecar,
};
use crate::crawler::frontier::{Commit, Frontier};
use crate::engine::{HeaderMeta, RenderEngine};
use crate::output::ProgressReporter;
use crate::state::Outcome;
use crate::SitePdfError;
use futures::FutureExt;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

/// How one URL ended, with a human-readable detail for the progress line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub outcome: Outcome,
    pub detail: Option<String>,

    /// Artifact written, for committed outcomes
    pub path: Option<PathBuf>,
}

impl PageOutcome {
    fn new(outcome: Outcome, detail: Option<String>) -> Self {
        Self {
            outcome,
            detail,
            path: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(Outcome::Failed, Some(message.into()))
    }

    fn committed(outcome: Outcome, path: PathBuf) -> Self {
        Self {
            outcome,
            detail: Some(path.display().to_string()),
            path: Some(path),
        }
    }
}

/// Where a render goes and whether it replaces an existing artifact
struct Target {
    path: PathBuf,
    replaces: bool,
}

/// Drives one claimed URL through the render engine
pub struct PageRenderer<E: RenderEngine> {
    engine: Arc<E>,
    frontier: Arc<Frontier>,
    namer: Arc<ArtifactNamer>,
    reporter: Arc<ProgressReporter>,
    mode: ExistsMode,
}

impl<E: RenderEngine> PageRenderer<E> {
    pub fn new(
        engine: Arc<E>,
        frontier: Arc<Frontier>,
        namer: Arc<ArtifactNamer>,
        reporter: Arc<ProgressReporter>,
        mode: ExistsMode,
    ) -> Self {
        Self {
            engine,
            frontier,
            namer,
            reporter,
            mode,
        }
    }

    pub fn mode(&self) -> ExistsMode {
        self.mode
    }

    /// Processes one claimed URL
    ///
    /// Per-page failures come back as an `Outcome::Failed` value. The only
    /// error is `SitePdfError::Cancelled`. Once loaded, the page handle is
    /// closed before returning, and also before a panic is propagated.
    pub async fn process(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PageOutcome, SitePdfError> {
        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SitePdfError::Cancelled),
            loaded = self.engine.load_page(url) => loaded,
        };

        let page = match loaded {
            Ok(page) => page,
            Err(e) => return Ok(PageOutcome::failed(e.to_string())),
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(Err(SitePdfError::Cancelled)),
            outcome = AssertUnwindSafe(self.process_loaded(url, &page)).catch_unwind() => {
                outcome.map(Ok)
            }
        };

        self.engine.close(page).await;
        match result {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn process_loaded(&self, url: &str, page: &E::Page) -> PageOutcome {
        let title = match self.engine.title(page).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!("Could not read title of {}: {}", url, e);
                String::new()
            }
        };

        self.discover_links(url, page).await;

        if self.frontier.is_processed(url) {
            return PageOutcome::new(Outcome::AlreadyProcessed, None);
        }

        let content = match self.engine.content(page).await {
            Ok(content) => content,
            Err(e) => return PageOutcome::failed(e.to_string()),
        };
        let hash = content_hash(&content);

        let target = match self.choose_target(&title, url, &hash) {
            Ok(target) => target,
            Err(outcome) => return outcome,
        };

        let header = HeaderMeta::now(url);
        let bytes = match self.engine.render(page, &header).await {
            Ok(bytes) => bytes,
            Err(e) => return PageOutcome::failed(e.to_string()),
        };

        self.persist(url, &bytes, &hash, target)
    }

    /// Enqueues every same-domain link found on the page
    async fn discover_links(&self, url: &str, page: &E::Page) {
        self.refresh_total();

        let links = match self.engine.extract_links(page, url).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Could not extract links from {}: {}", url, e);
                return;
            }
        };

        let found = links.len();
        let added = links
            .iter()
            .filter_map(|raw| self.frontier.resolve_and_filter(raw, url))
            .filter(|candidate| self.frontier.enqueue(candidate))
            .count();

        tracing::debug!("{}: {} links, {} new", url, found, added);
        self.refresh_total();
    }

    fn refresh_total(&self) {
        self.reporter
            .set_total(self.frontier.visited_count() + self.frontier.queue_size());
    }

    /// Applies the exists-mode policy
    ///
    /// Existing artifacts are only those owned by `url`; a new artifact gets
    /// a name no other URL holds. `Err` carries a finished outcome (skipped
    /// or unchanged) that needs no render.
    fn choose_target(&self, title: &str, url: &str, hash: &str) -> Result<Target, PageOutcome> {
        let existing = self.namer.claim_existing(title, url);

        match (self.mode, existing) {
            (ExistsMode::Skip, Some(path)) => Err(PageOutcome::new(
                Outcome::Skipped,
                Some(format!("exists: {}", path.display())),
            )),
            (ExistsMode::Update | ExistsMode::Append, Some(path))
                if self.stored_hash_matches(&path, url, hash) =>
            {
                Err(PageOutcome::new(
                    Outcome::Unchanged,
                    Some(format!("content unchanged: {}", path.display())),
                ))
            }
            (ExistsMode::Update, Some(path)) => Ok(Target {
                path,
                replaces: true,
            }),
            (ExistsMode::Overwrite, Some(path)) => Ok(Target {
                path,
                replaces: false,
            }),
            (_, _) => Ok(Target {
                path: self.namer.full_path(&self.namer.generate_unique_name(title, url)),
                replaces: false,
            }),
        }
    }

    fn stored_hash_matches(&self, artifact: &Path, url: &str, hash: &str) -> bool {
        // Adopted artifacts may carry a hash-only sidecar
        read_sidecar(&self.namer.hash_path(artifact))
            .map(|sidecar| {
                sidecar.hash == hash && sidecar.url.as_deref().map_or(true, |owner| owner == url)
            })
            .unwrap_or(false)
    }

    /// Stages artifact and sidecar, then moves both into place in one commit
    ///
    /// Only the renames run under the frontier lock: sidecar first, artifact
    /// last. If the artifact rename fails the new sidecar is removed again.
    fn persist(&self, url: &str, bytes: &[u8], hash: &str, target: Target) -> PageOutcome {
        let staged = match self.stage(bytes) {
            Ok(staged) => staged,
            Err(e) => return PageOutcome::failed(e.to_string()),
        };
        let sidecar = match stage_sidecar(self.namer.output_dir(), &Sidecar::new(hash, url)) {
            Ok(sidecar) => sidecar,
            Err(e) => return PageOutcome::failed(e.to_string()),
        };

        let hash_path = self.namer.hash_path(&target.path);
        let committed = self.frontier.commit(url, || {
            sidecar.persist(&hash_path)?;
            if let Err(e) = staged.persist(&target.path) {
                if let Err(cleanup) = std::fs::remove_file(&hash_path) {
                    tracing::warn!("Could not remove {}: {}", hash_path.display(), cleanup);
                }
                return Err(ArtifactError::from(e));
            }
            Ok::<_, ArtifactError>(())
        });

        match committed {
            Ok(Commit::Committed(())) => {
                let outcome = if target.replaces {
                    Outcome::Updated
                } else {
                    Outcome::Created
                };
                PageOutcome::committed(outcome, target.path)
            }
            Ok(Commit::AlreadyProcessed) => PageOutcome::new(Outcome::AlreadyProcessed, None),
            Err(e) => PageOutcome::failed(e.to_string()),
        }
    }

    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile, ArtifactError> {
        let mut staged = NamedTempFile::new_in(self.namer.output_dir())?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }
}
