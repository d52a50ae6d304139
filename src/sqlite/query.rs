use std::sync::Arc;

use rusqlite::types::Value as SqliteValue;

use crate::error::DbError;
use crate::results::Row;
use crate::types::Value;

/// Extract a native [`Value`] from a `SQLite` row.
///
/// # Errors
/// Returns `DbError::QueryError` if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<Value, DbError> {
    let value: SqliteValue = row.get(idx).map_err(DbError::query)?;
    Ok(match value {
        SqliteValue::Null => Value::Null,
        SqliteValue::Integer(i) => Value::Int(i),
        SqliteValue::Real(f) => Value::Float(f),
        SqliteValue::Text(s) => Value::Text(s),
        SqliteValue::Blob(b) => Value::Blob(b),
    })
}

/// Build a [`Row`] from a `SQLite` row using the shared column names.
///
/// # Errors
/// Returns `DbError::QueryError` if any column cannot be read.
pub fn build_row(row: &rusqlite::Row<'_>, columns: &Arc<Vec<String>>) -> Result<Row, DbError> {
    let mut values = Vec::with_capacity(columns.len());
    for idx in 0..columns.len() {
        values.push(sqlite_extract_value(row, idx)?);
    }
    Ok(Row::new(Arc::clone(columns), values))
}

/// Column names of a prepared `SQLite` statement, as currently compiled.
#[must_use]
pub fn column_names(stmt: &rusqlite::Statement<'_>) -> Arc<Vec<String>> {
    Arc::new(stmt.column_names().into_iter().map(str::to_owned).collect())
}
