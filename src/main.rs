//! sitepdf main entry point
//!
//! This is the command-line interface for crawling a site into PDFs.

use anyhow::{bail, Context};
use clap::Parser;
use sitepdf::config::{load_config, Config, TerminationPolicy};
use sitepdf::crawler::Coordinator;
use sitepdf::engine::{ChromeEngine, RenderEngine};
use sitepdf::ExistsMode;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// sitepdf: save every page of a website as PDF
///
/// sitepdf crawls all pages reachable inside the domain of the start URL,
/// renders each one in headless Chromium and writes one PDF per page. Pages
/// whose content did not change since the last run are left alone.
#[derive(Parser, Debug)]
#[command(name = "sitepdf")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a website and save every page as PDF", long_about = None)]
struct Cli {
    /// Start URL; its domain limits the crawl (may come from --config)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Output directory [default: results/<domain>-pdfs]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of concurrent workers [default: 5]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Delay after each page, in seconds [default: 0.5]
    #[arg(short, long)]
    delay: Option<f64>,

    /// What to do when a PDF already exists [default: update]
    #[arg(long, value_enum)]
    exists_mode: Option<ExistsMode>,

    /// When idle workers stop [default: quiescence]
    #[arg(long, value_enum)]
    termination: Option<TerminationPolicy>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write a markdown summary of the run to this file
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Chromium executable to use
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let verbose = if cli.debug {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    setup_logging(verbose, cli.quiet);

    let config = build_config(&cli)?;
    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("sitepdf=info,warn"),
                1 => EnvFilter::new("sitepdf=debug,info"),
                2 => EnvFilter::new("sitepdf=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = url.clone();
    }
    if config.crawler.start_url.trim().is_empty() {
        bail!("No start URL given (pass one as argument or set crawler.start-url)");
    }

    if let Some(dir) = &cli.output {
        config.output.directory = Some(dir.clone());
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(seconds) = cli.delay {
        config.set_delay_seconds(seconds)?;
    }
    if let Some(mode) = cli.exists_mode {
        config.crawler.exists_mode = mode;
    }
    if let Some(termination) = cli.termination {
        config.crawler.termination = termination;
    }
    if let Some(path) = &cli.summary {
        config.output.summary_path = Some(path.clone());
    }
    if let Some(path) = &cli.chrome {
        config.render.chrome_path = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Workers: {}, delay: {}ms, exists mode: {}",
        config.crawler.workers,
        config.crawler.delay_ms,
        config.crawler.exists_mode
    );

    let engine = Arc::new(
        ChromeEngine::launch(&config.render)
            .await
            .context("Could not start the browser")?,
    );

    let coordinator = match Coordinator::new(config, Arc::clone(&engine)) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            shutdown_engine(&engine).await;
            return Err(e.into());
        }
    };

    let cancel = CancellationToken::new();
    let signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping workers");
                cancel.cancel();
            }
        }
    });

    let result = coordinator.run(cancel).await;
    signal.abort();
    shutdown_engine(&engine).await;

    match result {
        Ok(summary) => {
            summary.print_summary();
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

async fn shutdown_engine(engine: &ChromeEngine) {
    if let Err(e) = engine.shutdown().await {
        tracing::warn!("Browser shutdown failed: {}", e);
    }
}
