//! CLI presentation: batch report as text or json.

use crate::batch::{BatchReport, CatalogWarning, PassReport};
use crate::entity::EntityKind;
use crate::error::SeedError;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn heading(title: &str, color: bool) -> String {
    if color {
        format!("{}", title.bold().underline())
    } else {
        title.to_string()
    }
}

fn pass_title(pass: &PassReport) -> String {
    let label = match pass.kind {
        EntityKind::Building => "Buildings",
        EntityKind::Agent => "Agents",
    };
    format!("{} ({})", label, pass.outcomes.len())
}

/// The `Warnings:` block. Empty when there are no warnings.
pub fn format_warnings_text(warnings: &[CatalogWarning], color: bool) -> String {
    let mut out = String::new();
    if warnings.is_empty() {
        return out;
    }
    out.push_str(&heading("Warnings:", color));
    out.push('\n');
    for warning in warnings {
        let line = format!("  - {}", warning);
        if color {
            out.push_str(&format!("{}\n", line.yellow()));
        } else {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Human-readable report: warnings, one line per entity, then a summary table.
pub fn format_report_text(report: &BatchReport, color: bool) -> String {
    let mut out = format_warnings_text(&report.warnings, color);
    if !out.is_empty() {
        out.push('\n');
    }

    if report.dry_run {
        out.push_str("Dry run: no requests were sent.\n\n");
    }

    for pass in &report.passes {
        out.push_str(&heading(&pass_title(pass), color));
        out.push('\n');
        if pass.outcomes.is_empty() {
            out.push_str("  (no entities)\n");
        }
        for outcome in &pass.outcomes {
            let line = format!("  {}", outcome);
            if color && outcome.disposition.is_failure() {
                out.push_str(&format!("{}\n", line.red()));
            } else {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push('\n');
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if report.dry_run {
        table.set_header(vec!["Pass", "Planned", "Skipped"]);
    } else {
        table.set_header(vec!["Pass", "Generated", "No URL", "Skipped", "Failed"]);
    }
    for pass in &report.passes {
        let summary = pass.summary();
        let kind = pass.kind.to_string();
        if report.dry_run {
            table.add_row(vec![
                kind,
                summary.planned.to_string(),
                summary.skipped.to_string(),
            ]);
        } else {
            table.add_row(vec![
                kind,
                summary.generated.to_string(),
                summary.missing_url.to_string(),
                summary.skipped.to_string(),
                summary.failed.to_string(),
            ]);
        }
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_report_json(report: &BatchReport) -> Result<String, SeedError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| SeedError::Output(format!("Failed to serialize report: {}", e)))
}
