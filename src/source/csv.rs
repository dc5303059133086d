//! Minimal CSV reader.
//!
//! Supports a header row, comma separators, double-quoted fields with
//! embedded commas, newlines and `""` escapes, and LF or CRLF line endings.
//! Cells that look like numbers or booleans are typed; common missing-value
//! markers become null.

use std::fs;
use std::path::Path;

use serde_json::{Number, Value};

use super::table::Table;
use crate::error::{Result, StepgateError};

const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>",
];

/// Read a CSV file into a table.
pub fn read_csv(path: &Path) -> Result<Table> {
    tracing::debug!(path = %path.display(), "reading csv");
    let text = fs::read_to_string(path).map_err(|e| StepgateError::DataSource {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    parse_csv(&text)
}

/// Parse CSV text into a table. Empty input yields an empty table.
///
/// A leading UTF-8 byte-order mark is ignored.
pub fn parse_csv(text: &str) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = split_records(text)?.into_iter();
    let Some((_, header)) = records.next() else {
        return Ok(Table::empty());
    };

    let width = header.len();
    let mut table = Table::new(header);
    for (line, fields) in records {
        if fields.len() > width {
            return Err(StepgateError::DataSource {
                message: format!(
                    "line {}: expected {} fields, found {}",
                    line,
                    width,
                    fields.len()
                ),
            });
        }
        let mut row: Vec<Value> = fields.iter().map(|f| parse_cell(f)).collect();
        row.resize(width, Value::Null);
        table.push_row(row)?;
    }
    Ok(table)
}

/// Split text into records, each tagged with the line it starts on.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut record));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(StepgateError::DataSource {
            message: format!("line {}: unterminated quoted field", record_line),
        });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record_line, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, record: Vec<String>) {
    // blank line
    if record.len() == 1 && record[0].is_empty() {
        return;
    }
    records.push((line, record));
}

fn parse_cell(raw: &str) -> Value {
    if MISSING_MARKERS.contains(&raw) {
        return Value::Null;
    }
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    match trimmed {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
