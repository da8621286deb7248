//! Plain-text rendering of restored rows and table summaries.

use std::{borrow::Cow, fmt::Write as _};

use itertools::Itertools;

use crate::{frame::ColumnInfo, value::Value};

const GAP: &str = "  ";
const MIN_RULE: usize = 3;

/// Renders `rows` under `headers` as aligned columns with a dashed rule
/// below the header. Cells past the header count are dropped.
pub fn render_rows(headers: &[String], rows: &[Vec<Value>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|value| cell_text(value).into_owned()).collect())
        .collect();
    render_grid(headers, &cells)
}

/// Renders one line per column: name, storage type and missing count.
pub fn render_column_info(columns: &[ColumnInfo]) -> String {
    let headers = ["column", "storage", "missing"].map(String::from);
    let cells: Vec<Vec<String>> = columns
        .iter()
        .map(|info| {
            vec![
                info.name.clone(),
                info.storage.to_string(),
                info.null_count.to_string(),
            ]
        })
        .collect();
    render_grid(&headers, &cells)
}

fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| display_width(h).max(MIN_RULE))
        .collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = flatten(cell);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .join(GAP);
    line.trim_end().to_string()
}

fn cell_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::Text(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn print_rows(headers: &[String], rows: &[Vec<Value>]) {
    print!("{}", render_rows(headers, rows));
}
