//! Prepared statements and their fetch lifecycle.
//!
//! A [`Statement`] is created by [`Connection::prepare`] without touching the
//! driver. The first call that needs results (`execute`, any fetch,
//! `row_count`, `column_count`) prepares the driver statement, binds the
//! parameters with their inferred [`BindType`](crate::params::BindType)s and
//! runs it. Rows are then handed out according to the active [`FetchMode`].

mod iter;

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::connection::Connection;
use crate::driver::DriverStatement;
use crate::error::DbError;
use crate::fetch::{FetchMode, Shaper, project_pairs};
use crate::params::{BoundParam, Params};
use crate::results::{Fetched, FetchedAll, Pairs, Row};
use crate::types::Value;

pub use iter::Rows;

/// Where a statement is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    /// Created; the driver has not seen the SQL yet
    Pending,
    /// Driver statement prepared, no parameters bound
    Prepared,
    /// Parameters bound, not yet run
    Bound,
    /// Run at least once; the cursor may hold rows
    Executed,
    /// Every row was consumed and the cursor released; may be executed again
    Exhausted,
    /// Explicitly closed; fetches return nothing and execution is refused
    Closed,
}

pub struct Statement<'c> {
    conn: &'c Connection,
    sql: String,
    params: Vec<BoundParam>,
    handle: Option<Box<dyn DriverStatement>>,
    state: StatementState,
    mode: FetchMode,
    elapsed: Duration,
}

impl<'c> Statement<'c> {
    pub(crate) fn new(conn: &'c Connection, sql: String, params: &Params) -> Self {
        Self {
            conn,
            sql,
            params: params.bind_list(),
            handle: None,
            state: StatementState::Pending,
            mode: FetchMode::default(),
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters that will be (or were) bound, with their inferred bind types.
    #[must_use]
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    #[must_use]
    pub fn state(&self) -> StatementState {
        self.state
    }

    #[must_use]
    pub fn fetch_mode(&self) -> FetchMode {
        self.mode
    }

    /// Duration of the latest execution; zero until the statement has run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Set the shape of values returned by subsequent fetches.
    pub fn set_fetch_mode(&mut self, mode: FetchMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Run the statement. Non-empty `params` replace the bound set first;
    /// empty `params` re-run with whatever is bound.
    ///
    /// # Errors
    /// Returns `DbError::StatementClosed` after [`close`](Self::close), or the
    /// driver's error if preparing, binding or executing fails.
    pub fn execute(&mut self, params: impl Into<Params>) -> Result<bool, DbError> {
        if self.state == StatementState::Closed {
            return Err(DbError::StatementClosed);
        }
        let params = params.into();
        if !params.is_empty() {
            self.rebind(params.bind_list())?;
        }
        self.run()
    }

    /// Same as [`execute`](Self::execute).
    ///
    /// # Errors
    /// See [`execute`](Self::execute).
    pub fn call(&mut self, params: impl Into<Params>) -> Result<bool, DbError> {
        self.execute(params)
    }

    /// Number of rows affected by the latest execution (DML), or fetched from
    /// it so far (queries).
    ///
    /// # Errors
    /// Returns the driver's error if the implicit first execution fails.
    pub fn row_count(&mut self) -> Result<u64, DbError> {
        self.ensure_executed()?;
        Ok(self.handle.as_ref().map_or(0, |h| h.row_count()))
    }

    /// # Errors
    /// Returns the driver's error if the implicit first execution fails.
    pub fn column_count(&mut self) -> Result<usize, DbError> {
        self.ensure_executed()?;
        Ok(self.handle.as_ref().map_or(0, |h| h.column_count()))
    }

    /// # Errors
    /// Returns the driver's error if the implicit first execution fails.
    pub fn column_names(&mut self) -> Result<Arc<Vec<String>>, DbError> {
        self.ensure_executed()?;
        Ok(self
            .handle
            .as_ref()
            .map_or_else(|| Arc::new(Vec::new()), |h| h.column_names()))
    }

    /// Next unit of the active fetch mode, or `None` once rows are exhausted
    /// (which also releases the cursor).
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` if the result shape does not fit the
    /// mode, or the driver's error.
    pub fn fetch(&mut self) -> Result<Option<Fetched>, DbError> {
        let Some(columns) = self.open_columns()? else {
            return Ok(None);
        };
        let shaper = Shaper::new(self.mode, &columns)?;
        Ok(self.next_row()?.map(|row| shaper.shape(row)))
    }

    /// Drain every remaining row in the active mode's shape and release the cursor.
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` if the result shape does not fit the
    /// mode, or the driver's error.
    pub fn fetch_all(&mut self) -> Result<FetchedAll, DbError> {
        let Some(columns) = self.open_columns()? else {
            return Ok(Shaper::empty(self.mode));
        };
        let shaper = Shaper::new(self.mode, &columns)?;
        let rows = self.drain_rows()?;
        Ok(shaper.shape_all(rows))
    }

    /// Drain the remaining rows keyed by the `key` column (a plain list without
    /// one), holding the `value` column or the full row.
    ///
    /// Later rows win on duplicate keys.
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` for unknown column names, or the driver's error.
    pub fn fetch_pairs(&mut self, key: Option<&str>, value: Option<&str>) -> Result<Pairs, DbError> {
        let Some(columns) = self.open_columns()? else {
            return Ok(if key.is_some() {
                Pairs::Keyed(IndexMap::new())
            } else {
                Pairs::List(Vec::new())
            });
        };
        let rows = self.drain_rows()?;
        project_pairs(rows, &columns, key, value)
    }

    /// First value of the next row.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch_field(&mut self) -> Result<Option<Value>, DbError> {
        Ok(self
            .fetch_row()?
            .and_then(|row| row.into_values().into_iter().next()))
    }

    /// Values of the next row in column order; empty once rows are exhausted.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch_fields(&mut self) -> Result<Vec<Value>, DbError> {
        Ok(self.fetch_row()?.map(Row::into_values).unwrap_or_default())
    }

    /// Next row as a full [`Row`], whatever the active fetch mode.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch_row(&mut self) -> Result<Option<Row>, DbError> {
        if self.open_columns()?.is_none() {
            return Ok(None);
        }
        self.next_row()
    }

    /// Map the next row onto `T` by column name.
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` if the row does not deserialize into `T`.
    pub fn fetch_into<T: DeserializeOwned>(&mut self) -> Result<Option<T>, DbError> {
        self.fetch_row()?.map(|row| row_into(&row)).transpose()
    }

    /// Map every remaining row onto `T` by column name.
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` if a row does not deserialize into `T`.
    pub fn fetch_all_into<T: DeserializeOwned>(&mut self) -> Result<Vec<T>, DbError> {
        if self.open_columns()?.is_none() {
            return Ok(Vec::new());
        }
        self.drain_rows()?.iter().map(row_into).collect()
    }

    /// Forward-only iterator over the remaining fetch units.
    pub fn rows(&mut self) -> Rows<'_, 'c> {
        Rows::new(self)
    }

    /// Release the cursor. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.state == StatementState::Closed {
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.close_cursor();
        }
        self.state = StatementState::Closed;
        tracing::debug!(sql = %self.sql, "statement closed");
    }

    /// Replace the bound set. On failure the previous set stays bound.
    fn rebind(&mut self, bound: Vec<BoundParam>) -> Result<(), DbError> {
        let Some(handle) = self.handle.as_mut() else {
            let previous = std::mem::replace(&mut self.params, bound);
            if let Err(err) = self.driver() {
                self.params = previous;
                return Err(err);
            }
            return Ok(());
        };
        handle.clear_bindings();
        if let Err(err) = bind_all(handle.as_mut(), &bound) {
            handle.clear_bindings();
            if let Err(restore) = bind_all(handle.as_mut(), &self.params) {
                tracing::warn!(sql = %self.sql, error = %restore, "failed to restore previous bindings");
            }
            return Err(err);
        }
        self.params = bound;
        self.state = StatementState::Bound;
        Ok(())
    }

    fn driver(&mut self) -> Result<&mut Box<dyn DriverStatement>, DbError> {
        if self.handle.is_none() {
            let conn = self.conn;
            let mut handle = conn.driver_connection()?.prepare(&self.sql)?;
            tracing::debug!(sql = %self.sql, "statement prepared");
            if !self.params.is_empty() {
                bind_all(handle.as_mut(), &self.params)?;
            }
            self.handle = Some(handle);
            self.state = if self.params.is_empty() {
                StatementState::Prepared
            } else {
                StatementState::Bound
            };
        }
        match self.handle.as_mut() {
            Some(handle) => Ok(handle),
            None => Err(DbError::StatementClosed),
        }
    }

    fn run(&mut self) -> Result<bool, DbError> {
        let started = Instant::now();
        let ok = self.driver()?.execute()?;
        self.elapsed = started.elapsed();
        self.state = StatementState::Executed;
        tracing::debug!(
            sql = %self.sql,
            params = self.params.len(),
            elapsed_us = u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX),
            "statement executed"
        );
        Ok(ok)
    }

    fn ensure_executed(&mut self) -> Result<(), DbError> {
        match self.state {
            StatementState::Pending | StatementState::Prepared | StatementState::Bound => {
                self.run().map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Columns of a result that still has an open cursor; `None` when there is
    /// nothing left to read.
    fn open_columns(&mut self) -> Result<Option<Arc<Vec<String>>>, DbError> {
        if matches!(self.state, StatementState::Exhausted | StatementState::Closed) {
            return Ok(None);
        }
        let columns = self.column_names()?;
        if columns.is_empty() {
            self.finish();
            return Ok(None);
        }
        Ok(Some(columns))
    }

    fn next_row(&mut self) -> Result<Option<Row>, DbError> {
        let row = match self.handle.as_mut() {
            Some(handle) => handle.fetch_next()?,
            None => None,
        };
        if row.is_none() {
            self.finish();
        }
        Ok(row)
    }

    fn drain_rows(&mut self) -> Result<Vec<Row>, DbError> {
        if matches!(self.state, StatementState::Exhausted | StatementState::Closed) {
            return Ok(Vec::new());
        }
        let rows = match self.handle.as_mut() {
            Some(handle) => handle.fetch_all_remaining()?,
            None => Vec::new(),
        };
        self.finish();
        Ok(rows)
    }

    /// Release the cursor after exhaustion.
    fn finish(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.close_cursor();
        }
        if self.state != StatementState::Closed {
            self.state = StatementState::Exhausted;
        }
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("state", &self.state)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<'s, 'c> IntoIterator for &'s mut Statement<'c> {
    type Item = Result<Fetched, DbError>;
    type IntoIter = Rows<'s, 'c>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

fn bind_all(handle: &mut dyn DriverStatement, params: &[BoundParam]) -> Result<(), DbError> {
    for param in params {
        handle.bind_parameter(&param.key, &param.value, param.bind_type)?;
    }
    Ok(())
}

fn row_into<T: DeserializeOwned>(row: &Row) -> Result<T, DbError> {
    serde_json::from_value(row.to_json())
        .map_err(|e| DbError::FetchModeError(format!("cannot map row onto target: {e}")))
}
