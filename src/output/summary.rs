use super::ProgressCounts;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Result of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub start_url: String,
    pub base_domain: String,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,

    /// True when the run was cancelled before the frontier drained
    pub interrupted: bool,

    // Frontier state at the end of the run
    pub urls_visited: usize,
    pub urls_queued: usize,
    pub urls_processed: usize,

    pub counts: ProgressCounts,
}

impl CrawlSummary {
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Share of handled pages that did not fail, in percent
    pub fn success_rate(&self) -> f64 {
        if self.counts.processed == 0 {
            return 0.0;
        }
        (self.counts.processed - self.counts.failed) as f64 / self.counts.processed as f64 * 100.0
    }

    /// Artifacts written in this run
    pub fn artifacts_written(&self) -> u64 {
        self.counts.created + self.counts.updated
    }

    /// Formats the end-of-run report
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(60);
        let counts = &self.counts;
        let mut out = String::new();

        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        if self.interrupted {
            out.push_str("Crawl interrupted. Partial summary:\n");
        } else {
            out.push_str("Summary:\n");
        }
        out.push_str(&format!("  Processed: {} pages\n", counts.processed));
        out.push_str(&format!("  - Created: {}\n", counts.created));
        out.push_str(&format!("  - Updated: {}\n", counts.updated));
        out.push_str(&format!(
            "  - Skipped: {} (unchanged: {}, already processed: {})\n",
            counts.skipped, counts.unchanged, counts.already_processed
        ));
        out.push_str(&format!("  - Failed: {}\n", counts.failed));
        if self.interrupted {
            out.push_str(&format!("  Left in queue: {}\n", self.urls_queued));
        }
        out.push_str(&format!("  Output: {}\n", self.output_dir.display()));
        out.push_str(&format!("  Duration: {:.1}s\n", self.duration_seconds()));

        out.push_str(&format!("  Errors: {}\n", counts.errors.len()));
        if !counts.errors.is_empty() {
            out.push_str("\nErrors:\n");
            for error in &counts.errors {
                out.push_str(&format!("  - {}\n", error));
            }
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }

    /// Prints the end-of-run report to stderr
    pub fn print_summary(&self) {
        eprint!("{}", self.render_text());
    }
}
