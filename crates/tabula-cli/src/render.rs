//! Plain-text and JSON rendering of table pages.

use tabula_core::{Column, Row};

/// Widest a rendered cell may get before it is truncated
const MAX_CELL_WIDTH: usize = 40;

/// Display text of a cell, empty for missing and null cells
pub fn cell_text(row: &Row, prop: &str) -> String {
    match row.get(prop) {
        Some(value) if !value.is_null() => value.to_string(),
        _ => String::new(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Render rows as an aligned text table with a header line.
pub fn format_table(columns: &[Column], rows: &[&Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate(&cell_text(row, &c.prop), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.name, w = *w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(text, w)| format!("{:<w$}", text, w = *w))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out
}

/// Render rows as JSON objects restricted to the given columns.
pub fn rows_to_json(columns: &[Column], rows: &[&Row]) -> anyhow::Result<serde_json::Value> {
    let projected: Vec<Row> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .filter_map(|c| row.get(&c.prop).map(|v| (c.prop.clone(), v.clone())))
                .collect()
        })
        .collect();

    Ok(serde_json::to_value(projected)?)
}
