//! Contract between the statement layer and a concrete database driver.
//!
//! The layer never talks to a database directly: it opens a [`DriverConnection`]
//! through a [`Driver`], prepares [`DriverStatement`]s on it, and forwards bind,
//! execute and fetch calls one-to-one. Drivers surface their failures as
//! [`DbError`] with the native error kept as the source.

use std::sync::Arc;

use crate::config::ConnectOptions;
use crate::error::DbError;
use crate::params::{BindType, ParamKey};
use crate::results::Row;
use crate::types::{DriverKind, Value};

/// Factory for driver connections.
pub trait Driver {
    /// Short driver name used in log events.
    fn name(&self) -> &'static str;

    /// Open a connection for `options`.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` for a malformed target or an unreachable database.
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn DriverConnection>, DbError>;
}

/// An open driver connection.
pub trait DriverConnection {
    /// Prepare `sql`, failing with `DbError::QueryError` when the driver rejects it.
    ///
    /// # Errors
    /// Returns `DbError::QueryError` on malformed SQL.
    fn prepare(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DbError>;

    /// Run one or more statements without parameters or results.
    ///
    /// # Errors
    /// Returns `DbError::QueryError` if any statement fails.
    fn execute_batch(&self, sql: &str) -> Result<(), DbError>;

    /// Most recent auto-generated id, `None` when the driver has none to report.
    ///
    /// # Errors
    /// Returns `DbError` if the driver cannot be queried.
    fn last_insert_id(&self, sequence: Option<&str>) -> Result<Option<String>, DbError>;

    /// Quote `text` as a string literal for this driver's dialect.
    fn quote(&self, text: &str) -> String;

    /// # Errors
    /// Returns `DbError::TransactionError` if a transaction is already open.
    fn begin_transaction(&self) -> Result<bool, DbError>;

    /// # Errors
    /// Returns `DbError::TransactionError` if no transaction is open.
    fn commit(&self) -> Result<bool, DbError>;

    /// # Errors
    /// Returns `DbError::TransactionError` if no transaction is open.
    fn rollback(&self) -> Result<bool, DbError>;

    fn in_transaction(&self) -> bool;
}

/// A prepared statement and, once executed, its cursor.
pub trait DriverStatement {
    /// # Errors
    /// Returns `DbError::ParameterError` if `key` does not name a placeholder or the
    /// value cannot be bound with `bind_type`.
    fn bind_parameter(&mut self, key: &ParamKey, value: &Value, bind_type: BindType)
    -> Result<(), DbError>;

    /// Forget every bound parameter.
    fn clear_bindings(&mut self);

    /// Run the statement with the currently bound parameters, opening a new cursor.
    ///
    /// # Errors
    /// Returns `DbError::QueryError` on constraint violation, type mismatch or syntax error.
    fn execute(&mut self) -> Result<bool, DbError>;

    /// # Errors
    /// Returns `DbError::QueryError` if reading the next row fails.
    fn fetch_next(&mut self) -> Result<Option<Row>, DbError>;

    /// # Errors
    /// Returns `DbError::QueryError` if reading any row fails.
    fn fetch_all_remaining(&mut self) -> Result<Vec<Row>, DbError>;

    /// Column names of the result, shared by every row it produces.
    fn column_names(&self) -> Arc<Vec<String>>;

    /// Rows affected by the latest execution, or rows fetched from it so far.
    fn row_count(&self) -> u64;

    fn column_count(&self) -> usize;

    /// Release the cursor. Calling it without an open cursor is a no-op.
    fn close_cursor(&mut self);
}

impl DriverKind {
    /// The compiled-in driver for this kind.
    #[must_use]
    pub fn driver(self) -> Box<dyn Driver> {
        match self {
            #[cfg(feature = "sqlite")]
            DriverKind::Sqlite => Box::new(crate::sqlite::SqliteDriver),
        }
    }
}
