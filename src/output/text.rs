//! Plain-text rendering of reports for the terminal.

use super::json::prepare_output_path;
use super::schema::{CallRecord, Report};
use crate::utils::error::OutputError;
use log::info;
use std::path::Path;

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn fmt_call(call: &CallRecord) -> String {
    if call.function_signature.is_empty() {
        call.function_name.clone()
    } else {
        format!("{} ({})", call.function_name, call.function_signature)
    }
}

/// Render a report as a human-readable summary
///
/// **Public** - used by the analyze command for stdout output
///
/// Verbose reports additionally list entry, exit and dangerous calls.
pub fn render_summary(report: &Report) -> String {
    let summary = &report.summary;
    let rule = "=".repeat(80);

    let mut lines = vec![
        rule.clone(),
        "ATTACK SURFACE SUMMARY".to_string(),
        rule.clone(),
        format!("Source:              {}", report.source),
        format!("Nodes:               {}", summary.nodes_count),
        format!("Edges:               {}", summary.edges_count),
        format!("Entry Points:        {}", summary.entry_points_count),
        format!("Exit Points:         {}", summary.exit_points_count),
        format!("Dangerous Functions: {}", summary.dangerous_functions_count),
        format!("Execution Paths:     {}", summary.execution_paths_count),
        format!(
            "Avg Path Length:     {}",
            fmt_optional(summary.avg_execution_path_length)
        ),
        format!(
            "Median Path Length:  {}",
            fmt_optional(summary.median_execution_path_length)
        ),
        format!(
            "Distance Dangerous:  {}",
            fmt_optional(summary.distance_dangerous)
        ),
    ];
    if !report.parse_errors.is_empty() {
        lines.push(format!("Parse Errors:        {}", report.parse_errors.len()));
    }

    if let Some(details) = &report.details {
        let sections = [
            ("ENTRY POINTS", &details.entry_points),
            ("EXIT POINTS", &details.exit_points),
            ("DANGEROUS FUNCTIONS", &details.dangerous_functions),
        ];
        for (title, calls) in sections {
            lines.push(String::new());
            lines.push(format!("{} ({})", title, calls.len()));
            lines.extend(calls.iter().map(|call| format!("  {}", fmt_call(call))));
        }
        lines.push(String::new());
        lines.push(format!(
            "Distance Entry:      {}",
            fmt_optional(details.distance_entry)
        ));
        lines.push(format!(
            "Distance Exit:       {}",
            fmt_optional(details.distance_exit)
        ));
    }

    lines.push(rule);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write the text summary to a file
///
/// # Errors
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_summary(report: &Report, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing summary to: {}", output_path.display());
    prepare_output_path(output_path)?;
    std::fs::write(output_path, render_summary(report))?;
    Ok(())
}

/// Render recorded parse errors, one per line
pub fn render_parse_errors(report: &Report) -> String {
    report
        .parse_errors
        .iter()
        .map(|e| format!("{}:{}: {}: {:?}\n", e.origin, e.line_number, e.reason, e.line))
        .collect()
}
