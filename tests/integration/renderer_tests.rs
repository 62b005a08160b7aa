//! Integration tests for the page renderer and the exists-mode policy
//!
//! These drive `PageRenderer::process` directly so races and policy
//! decisions can be set up precisely.

mod support;

use sitepdf::crawler::{Frontier, PageRenderer};
use sitepdf::output::ProgressReporter;
use sitepdf::artifact::{content_hash, read_sidecar};
use sitepdf::{ArtifactNamer, ExistsMode, Outcome, SitePdfError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use support::{all_files, files_with_extension, shared, small_site, StaticSiteEngine, START_URL};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// One fresh run over `dir`: new frontier, new namer
fn renderer(
    engine: &Arc<StaticSiteEngine>,
    dir: &Path,
    mode: ExistsMode,
) -> (Arc<Frontier>, PageRenderer<StaticSiteEngine>) {
    renderer_from(START_URL, engine, dir, mode)
}

fn renderer_from(
    start_url: &str,
    engine: &Arc<StaticSiteEngine>,
    dir: &Path,
    mode: ExistsMode,
) -> (Arc<Frontier>, PageRenderer<StaticSiteEngine>) {
    let frontier = Arc::new(Frontier::new(start_url).unwrap());
    let namer = Arc::new(ArtifactNamer::new(dir).unwrap());
    let renderer = PageRenderer::new(
        Arc::clone(engine),
        Arc::clone(&frontier),
        namer,
        Arc::new(ProgressReporter::new()),
        mode,
    );
    (frontier, renderer)
}

async fn process_once(
    engine: &Arc<StaticSiteEngine>,
    dir: &Path,
    mode: ExistsMode,
    url: &str,
) -> Outcome {
    let (_frontier, renderer) = renderer(engine, dir, mode);
    renderer
        .process(url, &CancellationToken::new())
        .await
        .unwrap()
        .outcome
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_workers_racing_on_one_url() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site().barrier(2));
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Overwrite);
    let renderer = Arc::new(renderer);

    let url = "https://example.com/a";
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let renderer = Arc::clone(&renderer);
            tokio::spawn(async move { renderer.process(url, &CancellationToken::new()).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap().unwrap().outcome);
    }
    outcomes.sort_by_key(|o| o.as_str());

    assert_eq!(outcomes, vec![Outcome::AlreadyProcessed, Outcome::Created]);
    assert!(frontier.is_processed(url));
    assert_eq!(engine.load_count(url), 2);
    assert_eq!(engine.open_pages(), 0);

    // One artifact, one sidecar, no staged leftovers
    let files = all_files(dir.path());
    assert_eq!(files.len(), 2, "unexpected files: {:?}", files);
    assert_eq!(files_with_extension(dir.path(), "pdf"), vec!["Alpha_a.pdf"]);
}

#[tokio::test]
async fn test_links_are_enqueued_once() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Update);

    let start = frontier.dequeue().unwrap();
    let page = renderer
        .process(&start, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.outcome, Outcome::Created);
    assert_eq!(page.path, Some(dir.path().join("Home.pdf")));
    assert_eq!(
        frontier.queued_urls(),
        vec!["https://example.com/a", "https://example.com/b"]
    );
}

#[tokio::test]
async fn test_relative_links_resolve_against_directory_page() {
    let dir = TempDir::new().unwrap();
    let engine = StaticSiteEngine::new().page(
        "https://example.com/docs/",
        "Docs",
        "docs",
        &["intro", "./guide/", "../about"],
    );
    let engine = shared(engine);
    let (frontier, renderer) =
        renderer_from("https://example.com/docs/", &engine, dir.path(), ExistsMode::Update);

    let start = frontier.dequeue().unwrap();
    assert_eq!(start, "https://example.com/docs");
    renderer
        .process(&start, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        frontier.queued_urls(),
        vec![
            "https://example.com/docs/intro",
            "https://example.com/docs/guide",
            "https://example.com/about",
        ]
    );
}

/// Two URLs whose title and last segment give the same base name
fn colliding_site() -> StaticSiteEngine {
    StaticSiteEngine::new()
        .page("https://example.com/docs/intro", "Docs", "docs body", &[])
        .page("https://example.com/blog/intro", "Docs", "blog body", &[])
}

const DOCS_INTRO: &str = "https://example.com/docs/intro";
const BLOG_INTRO: &str = "https://example.com/blog/intro";

async fn run_both(engine: &Arc<StaticSiteEngine>, dir: &Path, mode: ExistsMode) -> Vec<Outcome> {
    let (_frontier, renderer) = renderer(engine, dir, mode);
    let cancel = CancellationToken::new();
    let mut outcomes = Vec::new();
    for url in [DOCS_INTRO, BLOG_INTRO] {
        outcomes.push(renderer.process(url, &cancel).await.unwrap().outcome);
    }
    outcomes
}

#[tokio::test]
async fn test_update_mode_keeps_colliding_urls_apart() {
    let dir = TempDir::new().unwrap();
    let engine = shared(colliding_site());

    assert_eq!(
        run_both(&engine, dir.path(), ExistsMode::Update).await,
        vec![Outcome::Created, Outcome::Created]
    );
    assert_eq!(
        files_with_extension(dir.path(), "pdf"),
        vec!["Docs_intro.pdf", "Docs_intro_1.pdf"]
    );

    assert_eq!(
        run_both(&engine, dir.path(), ExistsMode::Update).await,
        vec![Outcome::Unchanged, Outcome::Unchanged]
    );

    engine.set_content(BLOG_INTRO, "blog body v2");
    assert_eq!(
        run_both(&engine, dir.path(), ExistsMode::Update).await,
        vec![Outcome::Unchanged, Outcome::Updated]
    );
    let docs = std::fs::read_to_string(dir.path().join("Docs_intro.pdf")).unwrap();
    let blog = std::fs::read_to_string(dir.path().join("Docs_intro_1.pdf")).unwrap();
    assert!(docs.contains("docs body"));
    assert!(blog.contains("blog body v2"));
}

#[tokio::test]
async fn test_append_mode_keeps_colliding_urls_apart() {
    let dir = TempDir::new().unwrap();
    let engine = shared(colliding_site());
    engine.set_content(BLOG_INTRO, "docs body");

    // Same content on both URLs still gives each its own artifact
    assert_eq!(
        run_both(&engine, dir.path(), ExistsMode::Append).await,
        vec![Outcome::Created, Outcome::Created]
    );

    engine.set_content(BLOG_INTRO, "blog body");
    assert_eq!(
        run_both(&engine, dir.path(), ExistsMode::Append).await,
        vec![Outcome::Unchanged, Outcome::Created]
    );
    assert_eq!(
        run_both(&engine, dir.path(), ExistsMode::Append).await,
        vec![Outcome::Unchanged, Outcome::Unchanged]
    );
    assert_eq!(
        files_with_extension(dir.path(), "pdf"),
        vec!["Docs_intro.pdf", "Docs_intro_1.pdf", "Docs_intro_2.pdf"]
    );
}

#[tokio::test]
async fn test_skip_mode_does_not_skip_another_urls_file() {
    let dir = TempDir::new().unwrap();
    let engine = shared(colliding_site());

    process_once(&engine, dir.path(), ExistsMode::Skip, DOCS_INTRO).await;
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Skip, BLOG_INTRO).await,
        Outcome::Created
    );
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Skip, BLOG_INTRO).await,
        Outcome::Skipped
    );
}

#[tokio::test]
async fn test_update_mode_lifecycle() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let url = "https://example.com/b";

    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Update, url).await,
        Outcome::Created
    );
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Update, url).await,
        Outcome::Unchanged
    );

    engine.set_content(url, "beta v2");
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Update, url).await,
        Outcome::Updated
    );

    let stored = read_sidecar(&dir.path().join("Beta_b.sha256")).unwrap();
    assert_eq!(stored.hash, content_hash("beta v2"));
    assert!(stored.is_owned_by(url));
    assert_eq!(engine.render_count(), 2);
}

#[tokio::test]
async fn test_update_mode_rerenders_without_sidecar() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let url = "https://example.com/b";

    process_once(&engine, dir.path(), ExistsMode::Update, url).await;
    std::fs::remove_file(dir.path().join("Beta_b.sha256")).unwrap();

    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Update, url).await,
        Outcome::Updated
    );
}

#[tokio::test]
async fn test_append_idempotence() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let url = "https://example.com/a";

    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Append, url).await,
        Outcome::Created
    );
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Append, url).await,
        Outcome::Unchanged
    );
    assert_eq!(files_with_extension(dir.path(), "pdf"), vec!["Alpha_a.pdf"]);

    engine.set_content(url, "alpha v2");
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Append, url).await,
        Outcome::Created
    );
    assert_eq!(
        files_with_extension(dir.path(), "pdf"),
        vec!["Alpha_a.pdf", "Alpha_a_1.pdf"]
    );

    // The newest version is what later runs compare against
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Append, url).await,
        Outcome::Unchanged
    );

    engine.set_content(url, "alpha v1");
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Append, url).await,
        Outcome::Created
    );
    assert_eq!(files_with_extension(dir.path(), "pdf").len(), 3);
}

#[tokio::test]
async fn test_skip_mode_does_not_render_existing() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let url = "https://example.com/c";

    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Skip, url).await,
        Outcome::Created
    );
    engine.set_content(url, "gamma v2");
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Skip, url).await,
        Outcome::Skipped
    );
    assert_eq!(engine.render_count(), 1);
}

#[tokio::test]
async fn test_overwrite_mode_replaces_file() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let url = START_URL;

    process_once(&engine, dir.path(), ExistsMode::Overwrite, url).await;
    engine.set_content(url, "home v2");
    assert_eq!(
        process_once(&engine, dir.path(), ExistsMode::Overwrite, url).await,
        Outcome::Created
    );

    let written = std::fs::read_to_string(dir.path().join("Home.pdf")).unwrap();
    assert!(written.contains("home v2"));
    assert_eq!(files_with_extension(dir.path(), "pdf"), vec!["Home.pdf"]);
}

#[tokio::test]
async fn test_same_title_pages_get_distinct_names() {
    let dir = TempDir::new().unwrap();
    let engine = StaticSiteEngine::new()
        .page("https://example.com/docs/intro", "Docs", "one", &[])
        .page("https://example.com/blog/intro", "Docs", "two", &[]);
    let engine = shared(engine);
    let (_frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Append);

    let cancel = CancellationToken::new();
    for url in ["https://example.com/docs/intro", "https://example.com/blog/intro"] {
        let page = renderer.process(url, &cancel).await.unwrap();
        assert_eq!(page.outcome, Outcome::Created);
    }

    assert_eq!(
        files_with_extension(dir.path(), "pdf"),
        vec!["Docs_intro.pdf", "Docs_intro_1.pdf"]
    );
}

#[tokio::test]
async fn test_render_failure_leaves_url_unprocessed() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site().fail_render(START_URL));
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Update);

    let page = renderer
        .process(START_URL, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.outcome, Outcome::Failed);
    assert!(page.detail.unwrap().contains("printToPDF failed"));
    assert!(!frontier.is_processed(START_URL));
    assert!(all_files(dir.path()).is_empty());
    assert_eq!(engine.open_pages(), 0);
}

#[tokio::test]
async fn test_processed_url_is_not_rendered_again() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Overwrite);

    frontier.mark_processed(START_URL);
    let page = renderer
        .process(START_URL, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.outcome, Outcome::AlreadyProcessed);
    assert_eq!(engine.render_count(), 0);
}

#[tokio::test]
async fn test_cancel_before_load() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let (_frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Update);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = renderer.process(START_URL, &cancel).await;
    assert!(matches!(result, Err(SitePdfError::Cancelled)));
    assert!(engine.loads().is_empty());
}

#[tokio::test]
async fn test_cancel_during_render_closes_page() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site().render_delay(Duration::from_secs(5)));
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Update);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = renderer.process(START_URL, &cancel).await;
    assert!(matches!(result, Err(SitePdfError::Cancelled)));
    assert_eq!(engine.open_pages(), 0);
    assert_eq!(engine.closed_pages(), 1);
    assert!(!frontier.is_processed(START_URL));
    assert!(files_with_extension(dir.path(), "pdf").is_empty());
}

#[tokio::test]
async fn test_sidecar_failure_leaves_no_artifact() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site());
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Overwrite);

    // A directory where the sidecar belongs makes its rename fail
    std::fs::create_dir(dir.path().join("Home.sha256")).unwrap();

    let page = renderer
        .process(START_URL, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.outcome, Outcome::Failed);
    assert!(!frontier.is_processed(START_URL));
    assert!(files_with_extension(dir.path(), "pdf").is_empty());
    assert_eq!(all_files(dir.path()), vec![dir.path().join("Home.sha256")]);
}

#[tokio::test]
async fn test_panic_closes_page_before_unwinding() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site().panic_on(START_URL));
    let (frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Update);

    let cancel = CancellationToken::new();
    let result = AssertUnwindSafe(renderer.process(START_URL, &cancel))
        .catch_unwind()
        .await;

    assert!(result.is_err());
    assert_eq!(engine.open_pages(), 0);
    assert_eq!(engine.closed_pages(), 1);
    assert!(!frontier.is_processed(START_URL));
}

#[tokio::test]
async fn test_cancel_during_load_leaves_no_open_page() {
    let dir = TempDir::new().unwrap();
    let engine = shared(small_site().load_delay(Duration::from_secs(5)));
    let (_frontier, renderer) = renderer(&engine, dir.path(), ExistsMode::Update);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = renderer.process(START_URL, &cancel).await;
    assert!(matches!(result, Err(SitePdfError::Cancelled)));
    assert_eq!(engine.loads().len(), 1);
    assert_eq!(engine.open_pages(), 0);
    assert_eq!(engine.closed_pages(), 0);
}
