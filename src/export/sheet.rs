//! Spreadsheet export as CSV.
//!
//! The header row is the union of every row's keys in first-seen order, so
//! sparse rows still line up. Nested arrays and objects are written as JSON
//! text in a single cell.

use serde::Serialize;
use serde_json::Value;

use super::ExportError;

/// Lets spreadsheet apps pick UTF-8 instead of the local code page.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column for rows that are not JSON objects.
const SCALAR_COLUMN: &str = "value";

/// Ordered union of the keys across `rows`.
#[must_use]
pub fn header(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        match row {
            Value::Object(map) => {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
            _ => {
                if !columns.iter().any(|c| c == SCALAR_COLUMN) {
                    columns.push(SCALAR_COLUMN.to_owned());
                }
            }
        }
    }
    columns
}

#[must_use]
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Serialize typed records into JSON rows.
///
/// # Errors
///
/// Returns `Serialize` if a record fails to serialize.
pub fn rows_of<T: Serialize>(records: &[T]) -> Result<Vec<Value>, ExportError> {
    records.iter().map(|r| serde_json::to_value(r).map_err(ExportError::from)).collect()
}

/// CSV bytes (with a UTF-8 BOM) for `rows`. An empty input yields only the BOM.
///
/// # Errors
///
/// Returns `Csv` if the writer fails.
pub fn to_csv(rows: &[Value]) -> Result<Vec<u8>, ExportError> {
    let columns = header(rows);
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| match row {
                Value::Object(map) => map.get(column).map(cell).unwrap_or_default(),
                other if column == SCALAR_COLUMN => cell(other),
                _ => String::new(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.into_inner().map_err(|e| ExportError::Csv(e.into_error().into()))
}

#[cfg(test)]
#[path = "sheet_test.rs"]
mod tests;
