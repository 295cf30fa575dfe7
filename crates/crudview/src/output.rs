//! Output formatting: table, JSON, YAML, plain.
//!
//! Records are raw JSON objects, so the table is built column by column
//! from the keys the records carry instead of a `Tabled` derive.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use crudview_core::{Entity, ListNavigator};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of records in the chosen format.
pub fn render_list(format: &OutputFormat, records: &[Value]) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table => render_table(records),
        OutputFormat::Json => serde_json::to_string_pretty(records)?,
        OutputFormat::JsonCompact => serde_json::to_string(records)?,
        OutputFormat::Yaml => serde_yaml::to_string(records)?,
        OutputFormat::Plain => records.iter().map(plain_id).collect::<Vec<_>>().join("\n"),
    })
}

/// Render one record in the chosen format. Tables show a field/value grid.
pub fn render_single(format: &OutputFormat, record: &Value) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table => render_detail(record),
        OutputFormat::Json => serde_json::to_string_pretty(record)?,
        OutputFormat::JsonCompact => serde_json::to_string(record)?,
        OutputFormat::Yaml => serde_yaml::to_string(record)?,
        OutputFormat::Plain => plain_id(record),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print the view's result message to stderr so stdout stays parseable.
pub fn print_status(message: &str, success: bool, color: bool, quiet: bool) {
    if quiet || message.is_empty() {
        return;
    }
    let mut stderr = io::stderr().lock();
    let _ = match (color, success) {
        (true, true) => writeln!(stderr, "{}", message.green()),
        (true, false) => writeln!(stderr, "{}", message.red()),
        (false, _) => writeln!(stderr, "{message}"),
    };
}

/// One-line page indicator, e.g. `pages: 1 [2] 3  (3 total)`.
pub fn navigator_line(navigator: &ListNavigator) -> String {
    if navigator.links().is_empty() {
        return String::new();
    }
    let links = navigator
        .links()
        .iter()
        .map(|&page| {
            if page == u64::from(navigator.current_page) {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("pages: {links}  ({} total)", navigator.total_pages())
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table(records: &[Value]) -> String {
    let columns = collect_columns(records);
    if columns.is_empty() {
        // Scalar records: one column.
        let mut builder = Builder::default();
        builder.push_record(["value"]);
        for record in records {
            builder.push_record([cell(record)]);
        }
        return builder.build().with(Style::rounded()).to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(String::as_str));
    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|col| record.get(col).map(cell).unwrap_or_default()),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_detail(record: &Value) -> String {
    let Some(obj) = record.as_object() else {
        return cell(record);
    };
    let mut builder = Builder::default();
    for (field, value) in obj {
        builder.push_record([field.clone(), cell(value)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Union of object keys, in first-seen order.
fn collect_columns(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for obj in records.iter().filter_map(Value::as_object) {
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn plain_id(record: &Value) -> String {
    record
        .key()
        .map_or_else(|| cell(record), |key| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_uses_union_of_keys() {
        let records = vec![json!({"id": 1, "name": "A"}), json!({"id": 2, "city": "Delft"})];
        let table = render_table(&records);
        let header = table.lines().nth(1).unwrap_or_default();
        assert!(header.contains("id"));
        assert!(header.contains("name"));
        assert!(header.contains("city"));
        assert!(table.contains("Delft"));
    }

    #[test]
    fn plain_prints_keys() {
        let records = vec![json!({"_datakey": "k1", "id": 1}), json!({"id": 2})];
        let out = render_list(&OutputFormat::Plain, &records).unwrap_or_default();
        assert_eq!(out, "k1\n2");
    }

    #[test]
    fn navigator_marks_current_page() {
        let nav = ListNavigator::new(2, 10, 23, 10);
        assert_eq!(navigator_line(&nav), "pages: 1 [2] 3  (3 total)");
    }
}
