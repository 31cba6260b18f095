//! Outcome reporting.

use std::path::Path;

use console::style;

use crate::error::Result;
use crate::pipeline::{BatchStats, PipelineOutcome};

/// Print one line per URL: stage reached, success or failure, and segments
/// lost on partial success. Enough for the caller to decide which URLs to
/// re-run.
pub fn print_outcomes(outcomes: &[PipelineOutcome]) {
    println!();
    println!("{}", style("Results:").bold());
    for outcome in outcomes {
        match &outcome.failure {
            None => {
                let output = outcome
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                if outcome.is_partial() {
                    println!(
                        "  {} {} -> {} ({} of {} segments lost)",
                        style("PARTIAL").yellow().bold(),
                        outcome.url,
                        output,
                        outcome.segments_failed,
                        outcome.segments_attempted,
                    );
                } else {
                    println!(
                        "  {} {} -> {}",
                        style("DONE").green().bold(),
                        outcome.url,
                        output,
                    );
                }
            }
            Some(failure) => {
                println!(
                    "  {} {} ({}: {})",
                    style("FAILED").red().bold(),
                    outcome.url,
                    failure.stage,
                    failure.cause,
                );
            }
        }
    }
}

/// Print aggregated statistics across the batch.
pub fn print_batch_summary(stats: &BatchStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Summary:").bold());
    println!("  URLs processed:   {}", stats.total());
    println!("  Completed:        {}", style(stats.done).green());
    if stats.partial > 0 {
        println!(
            "  Partial outputs:  {}",
            style(stats.partial).yellow()
        );
    }
    if stats.failed > 0 {
        println!("  Failed:           {}", style(stats.failed).red());
    }
    println!("  Segments fetched: {}", stats.segments_fetched);
    if stats.segments_failed > 0 {
        println!(
            "  Segments lost:    {}",
            style(stats.segments_failed).yellow()
        );
    }
    println!("{}", style("═".repeat(50)).dim());
}

/// Write the outcome sequence as a JSON report.
pub fn write_json_report(outcomes: &[PipelineOutcome], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(outcomes)?;
    std::fs::write(path, json)?;
    Ok(())
}
