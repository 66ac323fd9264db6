//! CSV and JSON export of report tables
//!
//! Records are JSON objects (any `Serialize` row becomes one). Column
//! headers come from the first record's keys in field order; nested values
//! are flattened into a single cell.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analytics::{ReportData, ReportKind};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: the report has no rows")]
    EmptyDataset,

    #[error("Record {index} is not an object")]
    NotAnObject { index: usize },

    #[error("Failed to write export file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize export rows")]
    Serialize(#[from] serde_json::Error),
}

/// `<report-kind>-export-<YYYY-MM-DD>.csv`
pub fn export_filename(kind: ReportKind, date: NaiveDate) -> String {
    format!("{}-export-{}.csv", kind.slug(), date.format("%Y-%m-%d"))
}

/// Serialize rows into JSON records
pub fn to_records<T: Serialize>(rows: &[T]) -> Result<Vec<Value>, ExportError> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(ExportError::from))
        .collect()
}

/// Text of one cell before quoting.
///
/// null → empty, arrays → `;`-joined elements, objects → JSON text.
pub fn encode_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(";"),
        Value::Object(_) => value.to_string(),
    }
}

/// Quote a field containing a comma, quote or line break; inner quotes doubled
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render records as CSV text (header line plus one line per record).
///
/// # Errors
/// [`ExportError::EmptyDataset`] for an empty list,
/// [`ExportError::NotAnObject`] for a record that is not a JSON object.
pub fn render_csv(records: &[Value]) -> Result<String, ExportError> {
    let Some(first) = records.first() else {
        return Err(ExportError::EmptyDataset);
    };
    let Value::Object(first) = first else {
        return Err(ExportError::NotAnObject { index: 0 });
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut csv = String::new();
    let header_line: Vec<_> = headers.iter().map(|h| escape_field(h)).collect();
    csv.push_str(&header_line.join(","));
    csv.push('\n');

    for (index, record) in records.iter().enumerate() {
        let Value::Object(map) = record else {
            return Err(ExportError::NotAnObject { index });
        };
        let cells: Vec<String> = headers
            .iter()
            .map(|key| {
                let cell = map.get(key.as_str()).map(encode_cell).unwrap_or_default();
                escape_field(&cell).into_owned()
            })
            .collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }

    Ok(csv)
}

/// Write records to a CSV file.
///
/// The CSV is rendered before the file is touched, so an empty list leaves
/// no file behind.
///
/// # Arguments
/// * `records` - JSON objects, one per line
/// * `path` - Destination file path (created/overwritten)
///
/// # Examples
///
/// ```no_run
/// use estatedash_core::export::export_to_csv;
/// use serde_json::json;
/// use std::path::Path;
///
/// let rows = vec![json!({ "campaign": "Spring", "leads": 12 })];
/// export_to_csv(&rows, Path::new("campaigns.csv")).unwrap();
/// ```
pub fn export_to_csv(records: &[Value], path: &Path) -> Result<(), ExportError> {
    let csv = render_csv(records)?;
    write_file(path, csv.as_bytes())
}

/// Write rows as a pretty-printed JSON array
///
/// # Errors
/// [`ExportError::EmptyDataset`] for an empty list, IO errors otherwise
pub fn export_to_json<T: Serialize>(rows: &[T], path: &Path) -> Result<(), ExportError> {
    if rows.is_empty() {
        return Err(ExportError::EmptyDataset);
    }
    let json = serde_json::to_string_pretty(rows)?;
    write_file(path, json.as_bytes())
}

/// Export a computed report's main table into `dir` under the dated file name
pub fn export_report_csv(
    report: &ReportData,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_filename(report.kind(), date));
    export_to_csv(&report.export_records()?, &path)?;
    tracing::info!(report = report.kind().slug(), path = %path.display(), "Exported CSV");
    Ok(path)
}

/// Same as [`export_report_csv`] with a `.json` extension
pub fn export_report_json(
    report: &ReportData,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let path = dir
        .join(export_filename(report.kind(), date))
        .with_extension("json");
    export_to_json(&report.export_records()?, &path)?;
    tracing::info!(report = report.kind().slug(), path = %path.display(), "Exported JSON");
    Ok(path)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Create parent directory if needed
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    /// Split one CSV line on commas outside quotes
    fn split_line(line: &str) -> Vec<String> {
        let mut fields = vec![String::new()];
        let mut quoted = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' if quoted && chars.peek() == Some(&'"') => {
                    chars.next();
                    fields.last_mut().unwrap().push('"');
                }
                '"' => quoted = !quoted,
                ',' if !quoted => fields.push(String::new()),
                c => fields.last_mut().unwrap().push(c),
            }
        }
        fields
    }

    #[test]
    fn test_quoted_comma_round_trip() {
        let csv = render_csv(&[json!({ "A": "x,y", "B": 1 })]).unwrap();
        assert_eq!(csv, "A,B\n\"x,y\",1\n");

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(split_line(lines[1]), vec!["x,y", "1"]);
    }

    #[test]
    fn test_empty_list_is_an_error_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("empty.csv");

        assert!(matches!(render_csv(&[]), Err(ExportError::EmptyDataset)));
        assert!(matches!(
            export_to_csv(&[], &path),
            Err(ExportError::EmptyDataset)
        ));
        assert!(!path.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_quotes_and_newlines_escaped() {
        let csv = render_csv(&[json!({ "note": "say \"hi\"", "multi": "a\nb", "cr": "c\rd" })]).unwrap();
        assert_eq!(csv, "note,multi,cr\n\"say \"\"hi\"\"\",\"a\nb\",\"c\rd\"\n");
    }

    #[test]
    fn test_nested_values_flattened() {
        let csv = render_csv(&[json!({
            "tags": ["hot", "vip", 3],
            "meta": { "k": "v" },
            "none": null,
            "ok": true
        })])
        .unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(split_line(row), vec!["hot;vip;3", "{\"k\":\"v\"}", "", "true"]);
    }

    #[test]
    fn test_headers_from_first_record_only() {
        let csv = render_csv(&[
            json!({ "a": 1, "b": 2 }),
            json!({ "b": 3, "c": 4 }),
        ])
        .unwrap();
        assert_eq!(csv, "a,b\n1,2\n,3\n");
    }

    #[test]
    fn test_non_object_record_rejected() {
        assert!(matches!(
            render_csv(&[json!({ "a": 1 }), json!("b")]),
            Err(ExportError::NotAnObject { index: 1 })
        ));
        assert!(matches!(
            render_csv(&[json!(1)]),
            Err(ExportError::NotAnObject { index: 0 })
        ));
    }

    #[test]
    fn test_filename_pattern() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(
            export_filename(ReportKind::Funnel, date),
            "lead-funnel-export-2026-03-15.csv"
        );
    }

    #[test]
    fn test_export_writes_file_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("rows.csv");

        #[derive(Serialize)]
        struct Row {
            campaign: String,
            leads: usize,
        }
        let records = to_records(&[Row {
            campaign: "Spring, 2026".to_string(),
            leads: 3,
        }])
        .unwrap();

        export_to_csv(&records, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "campaign,leads\n\"Spring, 2026\",3\n");
        assert!(!content.starts_with('\u{FEFF}'));
    }

    #[test]
    fn test_json_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.json");

        export_to_json(&[json!({ "a": 1 })], &path).unwrap();
        let back: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![json!({ "a": 1 })]);

        let empty: [Value; 0] = [];
        assert!(matches!(
            export_to_json(&empty, &dir.path().join("none.json")),
            Err(ExportError::EmptyDataset)
        ));
    }
}
