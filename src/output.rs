//! Console reporting for a [`TrafficSummary`].
//!
//! Supports the human-readable insight lines, pretty JSON, and a debug dump
//! into the structured log.

use anyhow::Result;
use tracing::{debug, info};

use crate::analyzers::types::TrafficSummary;
use crate::analyzers::utility::two_decimals;
use crate::parser::Ingested;

pub const COMPLETION_LINE: &str = "Analysis complete. Visualizations saved.";

/// Renders the insight lines in the order they are printed.
pub fn insight_lines(summary: &TrafficSummary) -> Vec<String> {
    let mut lines = vec![format!("Loaded {} rows successfully.", summary.rows_loaded)];

    if summary.rows_skipped > 0 {
        lines.push(format!(
            "Warning: {} rows were skipped due to formatting errors.",
            summary.rows_skipped
        ));
        let samples: Vec<String> = summary
            .skipped_samples
            .iter()
            .map(|s| quoted_list(&s.fields))
            .collect();
        lines.push(format!("Sample skipped rows: [{}]", samples.join(", ")));
    }

    lines.push(format!("Peak Traffic Hour: {}", summary.peak_hour));
    lines.push(format!(
        "Avg Traffic on Weekdays: {}",
        two_decimals(summary.day_type.weekday.average())
    ));
    lines.push(format!(
        "Avg Traffic on Weekends: {}",
        two_decimals(summary.day_type.weekend.average())
    ));
    lines.push(format!(
        "Avg Traffic on Rainy Days: {}",
        two_decimals(summary.rain.wet.average())
    ));
    lines.push(format!(
        "Avg Traffic on Snowy Days: {}",
        two_decimals(summary.snow.wet.average())
    ));

    lines
}

/// Renders fields as `['a', 'b']`, escaping embedded quotes and backslashes.
fn quoted_list(fields: &[String]) -> String {
    let quoted: Vec<String> = fields
        .iter()
        .map(|f| format!("'{}'", f.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Prints the insight lines to stdout.
pub fn print_insights(summary: &TrafficSummary) {
    for line in insight_lines(summary) {
        println!("{line}");
    }
}

/// Prints the summary as pretty JSON to stdout.
pub fn print_json(summary: &TrafficSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Logs the summary using Rust's debug pretty-print format.
pub fn log_pretty(summary: &TrafficSummary) {
    debug!("{:#?}", summary);
}

/// Lines describing an ingestion pass without aggregating it.
pub fn inspection_lines(source: &str, ingested: &Ingested) -> Vec<String> {
    let mut lines = vec![
        format!("Source: {source}"),
        format!("Data rows read: {}", ingested.rows_read),
        format!("Accepted: {}", ingested.records.len()),
        format!("Rejected: {}", ingested.rejected),
        format!("Blank lines skipped: {}", ingested.blank_lines),
    ];
    for sample in &ingested.samples {
        lines.push(format!(
            "  line {}: {} {:?}",
            sample.line, sample.reason, sample.fields
        ));
    }
    if ingested.samples.len() < ingested.rejected {
        lines.push(format!(
            "  ... {} more not shown",
            ingested.rejected - ingested.samples.len()
        ));
    }
    lines
}

pub fn print_inspection(source: &str, ingested: &Ingested) {
    info!(
        rows_read = ingested.rows_read,
        rejected = ingested.rejected,
        "Inspection complete"
    );
    for line in inspection_lines(source, ingested) {
        println!("{line}");
    }
}
