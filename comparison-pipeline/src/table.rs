use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Map, Value};

use common::error::AppError;

use crate::schema::ComparisonRecord;

/// Tabular view of a comparison: one row per record, one column per field seen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComparisonTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ComparisonTable {
    pub fn from_records(records: &[ComparisonRecord]) -> Result<Self, AppError> {
        let values = records
            .iter()
            .map(|record| {
                serde_json::to_value(record)
                    .map_err(|err| AppError::Formatting(format!("Could not serialize record: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_values(&values)
    }

    /// Builds the table from arbitrary JSON objects. Columns are the union of
    /// keys in first-seen order; absent keys and `null` become empty cells.
    pub fn from_values(values: &[Value]) -> Result<Self, AppError> {
        let objects = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value.as_object().ok_or_else(|| {
                    AppError::Formatting(format!("Record {index} is not a JSON object"))
                })
            })
            .collect::<Result<Vec<&Map<String, Value>>, _>>()?;

        let mut columns: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = objects
            .iter()
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(column).and_then(cell_text))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `{"columns": [...], "rows": [{column: cell, ...}]}`
    pub fn to_json_rows(&self) -> Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        (
                            column.clone(),
                            cell.clone().map_or(Value::Null, Value::String),
                        )
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();

        serde_json::json!({
            "columns": self.columns,
            "rows": Value::Array(rows),
        })
    }

    /// Pipe-separated rendering for terminals.
    pub fn render_text(&self) -> String {
        if self.columns.is_empty() {
            return "No differences reported.\n".to_string();
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                let len = cell.as_deref().map_or(0, |text| text.chars().count());
                *width = (*width).max(len);
            }
        }

        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        let rule: Vec<&str> = rule.iter().map(String::as_str).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(|cell| cell.as_deref().unwrap_or("")).collect();
            push_line(&mut out, &cells, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "| {} |", line.join(" | "));
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
