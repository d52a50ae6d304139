use rusqlite::types::Value as SqliteValue;

use crate::error::DbError;
use crate::params::BindType;
use crate::types::Value;

/// Convert a value into the rusqlite value matching its bind hint.
///
/// # Errors
/// Returns `DbError::ParameterError` if the value cannot be represented under `bind_type`.
pub fn to_sqlite_value(value: &Value, bind_type: BindType) -> Result<SqliteValue, DbError> {
    match (bind_type, value) {
        (BindType::Null, _) | (_, Value::Null) => Ok(SqliteValue::Null),
        (BindType::Bool, Value::Bool(b)) => Ok(SqliteValue::Integer(i64::from(*b))),
        (BindType::Int, Value::Int(i)) => Ok(SqliteValue::Integer(*i)),
        (BindType::Int, Value::Bool(b)) => Ok(SqliteValue::Integer(i64::from(*b))),
        (BindType::Lob, Value::Blob(bytes)) => Ok(SqliteValue::Blob(bytes.clone())),
        (BindType::Lob, Value::Text(s)) => Ok(SqliteValue::Blob(s.as_bytes().to_vec())),
        (BindType::Str, Value::Blob(bytes)) => String::from_utf8(bytes.clone())
            .map(SqliteValue::Text)
            .map_err(|_| DbError::ParameterError("binary value is not valid UTF-8 text".into())),
        (BindType::Str, other) => Ok(SqliteValue::Text(other.to_bind_text())),
        (hint, other) => Err(DbError::ParameterError(format!(
            "cannot bind {other:?} as {hint:?}"
        ))),
    }
}
