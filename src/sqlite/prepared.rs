use std::fmt;
use std::sync::Arc;

use rusqlite::types::Value as SqliteValue;

use crate::driver::DriverStatement;
use crate::error::DbError;
use crate::params::{BindType, ParamKey};
use crate::results::Row;
use crate::types::Value;

use super::params::to_sqlite_value;
use super::worker::{Command, CursorId, Executed, SqliteWorker};

/// Prepared `SQLite` statement.
///
/// The SQL is compiled at prepare time and kept in rusqlite's statement cache
/// on the connection's worker. Each execution binds the pending values there
/// and leaves a cursor open that is stepped one row per fetch.
pub struct SqliteStatement {
    worker: Arc<SqliteWorker>,
    query: Arc<String>,
    cursor: CursorId,
    columns: Arc<Vec<String>>,
    parameter_count: usize,
    bindings: Vec<(ParamKey, SqliteValue)>,
    cursor_open: bool,
    row_count: u64,
}

impl SqliteStatement {
    /// # Errors
    /// Returns `DbError::QueryError` if `SQLite` rejects the SQL.
    pub(crate) fn prepare(worker: Arc<SqliteWorker>, sql: &str) -> Result<Self, DbError> {
        let query = Arc::new(sql.to_owned());
        let info = worker.request(|respond_to| Command::Prepare {
            query: Arc::clone(&query),
            respond_to,
        })?;
        let cursor = worker.next_cursor_id();
        Ok(Self {
            worker,
            query,
            cursor,
            columns: info.columns,
            parameter_count: info.parameter_count,
            bindings: Vec::new(),
            cursor_open: false,
            row_count: 0,
        })
    }
}

impl fmt::Debug for SqliteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("query", &self.query)
            .field("columns", &self.columns)
            .field("cursor_open", &self.cursor_open)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl DriverStatement for SqliteStatement {
    fn bind_parameter(
        &mut self,
        key: &ParamKey,
        value: &Value,
        bind_type: BindType,
    ) -> Result<(), DbError> {
        if let ParamKey::Position(idx) = key {
            if *idx == 0 || *idx > self.parameter_count {
                return Err(DbError::ParameterError(format!(
                    "parameter position {idx} out of range (statement has {})",
                    self.parameter_count
                )));
            }
        }
        let converted = to_sqlite_value(value, bind_type)?;
        match self.bindings.iter_mut().find(|(bound, _)| bound == key) {
            Some(slot) => slot.1 = converted,
            None => self.bindings.push((key.clone(), converted)),
        }
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    fn execute(&mut self) -> Result<bool, DbError> {
        self.close_cursor();
        let executed = self.worker.request(|respond_to| Command::Execute {
            cursor: self.cursor,
            query: Arc::clone(&self.query),
            bindings: self.bindings.clone(),
            respond_to,
        })?;
        match executed {
            Executed::Rows { columns } => {
                self.columns = columns;
                self.cursor_open = true;
                self.row_count = 0;
            }
            Executed::Changes(affected) => {
                self.columns = Arc::new(Vec::new());
                self.row_count = affected;
            }
        }
        Ok(true)
    }

    fn fetch_next(&mut self) -> Result<Option<Row>, DbError> {
        if !self.cursor_open {
            return Ok(None);
        }
        let cursor = self.cursor;
        match self.worker.request(|respond_to| Command::FetchNext { cursor, respond_to }) {
            Ok(Some(row)) => {
                self.row_count += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                self.cursor_open = false;
                Ok(None)
            }
            Err(err) => {
                self.cursor_open = false;
                Err(err)
            }
        }
    }

    fn fetch_all_remaining(&mut self) -> Result<Vec<Row>, DbError> {
        if !self.cursor_open {
            return Ok(Vec::new());
        }
        self.cursor_open = false;
        let cursor = self.cursor;
        let rows = self
            .worker
            .request(|respond_to| Command::FetchRemaining { cursor, respond_to })?;
        self.row_count += rows.len() as u64;
        Ok(rows)
    }

    fn column_names(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn close_cursor(&mut self) {
        if self.cursor_open {
            self.cursor_open = false;
            // a worker that is gone has no cursor left to close
            let _ = self.worker.send(Command::CloseCursor {
                cursor: self.cursor,
            });
        }
    }
}

impl Drop for SqliteStatement {
    fn drop(&mut self) {
        self.close_cursor();
    }
}
