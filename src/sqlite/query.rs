use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::TrackerDbError;
use crate::results::RecordSet;
use crate::types::SqlValue;

/// Extract one column of a `SQLite` row as a `SqlValue`.
///
/// # Errors
///
/// Returns `TrackerDbError::SqliteError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<SqlValue, TrackerDbError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    })
}

/// Run a prepared `SQLite` query and collect every row.
///
/// # Errors
/// Returns `TrackerDbError::SqliteError` if execution or row extraction fails.
pub fn build_record_set(stmt: &mut Statement) -> Result<RecordSet, TrackerDbError> {
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = columns.len();

    let mut rows = stmt.query([])?;
    let mut record_set = RecordSet::with_capacity(columns, 10);
    while let Some(row) = rows.next()? {
        let values = (0..column_count)
            .map(|i| sqlite_extract_value(row, i))
            .collect::<Result<Vec<_>, _>>()?;
        record_set.add_row_values(values);
    }
    Ok(record_set)
}
