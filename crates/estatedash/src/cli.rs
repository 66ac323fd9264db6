//! Terminal output for the `report`, `reports` and `export` commands
//!
//! Reports print as comfy-table tables (or JSON) built from the same flat
//! records the CSV exporter writes.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use estatedash_core::export::{encode_cell, ExportError};
use estatedash_core::{LoadReport, Period, ReportData, ReportKind};
use serde_json::Value;

const MAX_CELL_CHARS: usize = 40;

// ============================================================================
// Formatters
// ============================================================================

/// Format a computed report as a title line plus table (human) or JSON
pub fn format_report(
    report: &ReportData,
    period: Period,
    json: bool,
    no_color: bool,
) -> Result<String, ExportError> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let title = format!("{} · {}", report.kind().name(), period.display());
    let underline = "=".repeat(title.chars().count());
    let records = report.export_records()?;
    let body = if records.is_empty() {
        "No data for this period.".to_string()
    } else {
        format_records(&records, no_color)
    };

    Ok(format!("{}\n{}\n\n{}", title, underline, body))
}

/// Table of flat JSON records; headers from the first record
pub fn format_records(records: &[Value], no_color: bool) -> String {
    let Some(Value::Object(first)) = records.first() else {
        return String::new();
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers.iter().map(|h| h.as_str()).collect::<Vec<_>>());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.as_str()).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for record in records {
        let Value::Object(map) = record else { continue };
        let row: Vec<String> = headers
            .iter()
            .map(|key| {
                let cell = map.get(key.as_str()).map(encode_cell).unwrap_or_default();
                truncate(&cell, MAX_CELL_CHARS)
            })
            .collect();
        table.add_row(row);
    }

    table.to_string()
}

/// Available reports with their slugs and the collections they read
pub fn format_report_list(no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers = ["#", "Slug", "Report", "Reads"];
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for kind in ReportKind::all() {
        let reads: Vec<&str> = kind
            .required_collections()
            .iter()
            .map(|c| c.name())
            .collect();
        table.add_row(vec![
            (kind.index() + 1).to_string(),
            kind.slug().to_string(),
            kind.name().to_string(),
            reads.join(", "),
        ]);
    }

    table.to_string()
}

/// One line per load problem: failed collections and truncated pages
pub fn format_load_warnings(report: &LoadReport) -> Vec<String> {
    report
        .errors
        .iter()
        .map(|e| {
            let label = e.severity.label();
            match &e.suggestion {
                Some(hint) => format!("{}: {}: {} ({})", label, e.source, e.message, hint),
                None => format!("{}: {}: {}", label, e.source, e.message),
            }
        })
        .collect()
}

// ============================================================================
// Utilities
// ============================================================================

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
