use super::Connection;
use crate::error::DbError;
use crate::fetch::FetchMode;
use crate::params::Params;
use crate::results::{Fetched, Pairs, Row};
use crate::statement::Statement;
use crate::types::Value;

impl Connection {
    /// Prepare `sql`, run `op` on the statement and close it on every exit path.
    fn with_statement<T, F>(&self, sql: &str, params: impl Into<Params>, op: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Statement<'_>) -> Result<T, DbError>,
    {
        let mut stmt = self.prepare(sql, params)?;
        let result = op(&mut stmt);
        stmt.close();
        result
    }

    /// Execute a statement and return the number of affected rows.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn execute(&self, sql: &str, params: impl Into<Params>) -> Result<u64, DbError> {
        self.with_statement(sql, params, |stmt| {
            stmt.execute(())?;
            stmt.row_count()
        })
    }

    /// Execute an INSERT and return the generated row id (0 when none).
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn insert(&self, sql: &str, params: impl Into<Params>) -> Result<i64, DbError> {
        self.with_statement(sql, params, |stmt| stmt.execute(()))?;
        self.last_insert_id()
    }

    /// First row of the result.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch(&self, sql: &str, params: impl Into<Params>) -> Result<Option<Row>, DbError> {
        self.with_statement(sql, params, |stmt| stmt.fetch_row())
    }

    /// Every row of the result.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch_all(&self, sql: &str, params: impl Into<Params>) -> Result<Vec<Row>, DbError> {
        self.with_statement(sql, params, |stmt| {
            Ok(stmt.fetch_all()?.into_rows().unwrap_or_default())
        })
    }

    /// Value of the 0-based column `index` in the first row.
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` if the result has no such column, or the driver's error.
    pub fn fetch_column(
        &self,
        sql: &str,
        params: impl Into<Params>,
        index: usize,
    ) -> Result<Option<Value>, DbError> {
        self.with_statement(sql, params, |stmt| {
            stmt.set_fetch_mode(FetchMode::Column(index));
            Ok(stmt.fetch()?.and_then(Fetched::into_value))
        })
    }

    /// First column of the first row.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch_field(&self, sql: &str, params: impl Into<Params>) -> Result<Option<Value>, DbError> {
        self.with_statement(sql, params, |stmt| stmt.fetch_field())
    }

    /// Values of the first row.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn fetch_fields(&self, sql: &str, params: impl Into<Params>) -> Result<Vec<Value>, DbError> {
        self.with_statement(sql, params, |stmt| stmt.fetch_fields())
    }

    /// Rows keyed by `key` holding `value` (see [`Statement::fetch_pairs`]).
    ///
    /// # Errors
    /// Returns `DbError::FetchModeError` for unknown column names, or the driver's error.
    pub fn fetch_pairs(
        &self,
        sql: &str,
        params: impl Into<Params>,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<Pairs, DbError> {
        self.with_statement(sql, params, |stmt| stmt.fetch_pairs(key, value))
    }
}
