//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a crawl run,
//! including outcome counts and the error log.

use crate::output::CrawlSummary;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of the run
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(io::Error)` - Failed to create or write the file
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let counts = &summary.counts;
    let mut md = String::new();

    // Title
    md.push_str("# sitepdf Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", summary.start_url));
    md.push_str(&format!("- **Domain**: {}\n", summary.base_domain));
    md.push_str(&format!(
        "- **Output Directory**: `{}`\n",
        summary.output_dir.display()
    ));
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S %:z")
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S %:z")
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration_seconds()
    ));
    let status = if summary.interrupted {
        "interrupted"
    } else {
        "completed"
    };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **URLs Visited**: {}\n", summary.urls_visited));
    md.push_str(&format!("- **URLs Left in Queue**: {}\n", summary.urls_queued));
    md.push_str(&format!(
        "- **Artifacts Written**: {}\n",
        summary.artifacts_written()
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // Outcome breakdown
    md.push_str("## Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Created | {} |\n", counts.created));
    md.push_str(&format!("| Updated | {} |\n", counts.updated));
    md.push_str(&format!("| Skipped | {} |\n", counts.skipped));
    md.push_str(&format!("| - Unchanged | {} |\n", counts.unchanged));
    md.push_str(&format!(
        "| - Already Processed | {} |\n",
        counts.already_processed
    ));
    md.push_str(&format!("| Failed | {} |\n", counts.failed));
    md.push_str(&format!("| **Total** | {} |\n\n", counts.processed));

    // Errors
    if !counts.errors.is_empty() {
        md.push_str("## Errors\n\n");
        for error in &counts.errors {
            md.push_str(&format!("- {}\n", error));
        }
        md.push('\n');
    }

    md
}
