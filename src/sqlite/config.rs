use std::time::Duration;

use crate::config::ConnectOptions;
use crate::error::DbError;

/// Recognised keys in [`ConnectOptions::options`] for the `SQLite` driver.
pub const OPT_BUSY_TIMEOUT: &str = "busy_timeout";
pub const OPT_JOURNAL_MODE: &str = "journal_mode";
pub const OPT_FOREIGN_KEYS: &str = "foreign_keys";

/// Open the database named by `target` (`:memory:`, a path or a `file:` URI)
/// and apply the driver options.
///
/// # Errors
/// Returns `DbError::ConnectionError` if the database cannot be opened and
/// `DbError::ConfigError` if an option value is invalid.
pub fn open_connection(
    options: &ConnectOptions,
    target: &str,
) -> Result<rusqlite::Connection, DbError> {
    if target.is_empty() {
        return Err(DbError::connection("empty SQLite database path"));
    }
    if options.username.is_some() || options.password.is_some() {
        tracing::debug!("sqlite driver ignores credentials");
    }

    let conn = rusqlite::Connection::open(target).map_err(DbError::connection)?;

    for (key, value) in &options.options {
        match key.as_str() {
            OPT_BUSY_TIMEOUT => {
                let millis: u64 = value.parse().map_err(|_| {
                    DbError::ConfigError(format!("{OPT_BUSY_TIMEOUT} must be milliseconds, got {value:?}"))
                })?;
                conn.busy_timeout(Duration::from_millis(millis))
                    .map_err(DbError::connection)?;
            }
            OPT_JOURNAL_MODE => {
                if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(DbError::ConfigError(format!(
                        "invalid {OPT_JOURNAL_MODE} {value:?}"
                    )));
                }
                conn.execute_batch(&format!("PRAGMA journal_mode = {value};"))
                    .map_err(DbError::connection)?;
            }
            OPT_FOREIGN_KEYS => {
                let enabled = parse_switch(value).ok_or_else(|| {
                    DbError::ConfigError(format!("invalid {OPT_FOREIGN_KEYS} {value:?}"))
                })?;
                let pragma = if enabled { "ON" } else { "OFF" };
                conn.execute_batch(&format!("PRAGMA foreign_keys = {pragma};"))
                    .map_err(DbError::connection)?;
            }
            other => tracing::warn!(option = other, "sqlite driver ignores unknown option"),
        }
    }

    Ok(conn)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
