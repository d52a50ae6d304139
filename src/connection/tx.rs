use super::Connection;
use crate::error::DbError;

impl Connection {
    /// # Errors
    /// Returns the driver's `DbError::TransactionError` if a transaction is already open.
    pub fn begin_transaction(&self) -> Result<bool, DbError> {
        let ok = self.driver_connection()?.begin_transaction()?;
        tracing::debug!("transaction started");
        Ok(ok)
    }

    /// # Errors
    /// Returns the driver's `DbError::TransactionError` if no transaction is open.
    pub fn commit(&self) -> Result<bool, DbError> {
        let ok = self.driver_connection()?.commit()?;
        tracing::debug!("transaction committed");
        Ok(ok)
    }

    /// # Errors
    /// Returns the driver's `DbError::TransactionError` if no transaction is open.
    pub fn rollback(&self) -> Result<bool, DbError> {
        let ok = self.driver_connection()?.rollback()?;
        tracing::debug!("transaction rolled back");
        Ok(ok)
    }

    /// # Errors
    /// Returns `DbError::ConnectionError` if the connection cannot be opened.
    pub fn in_transaction(&self) -> Result<bool, DbError> {
        Ok(self.driver_connection()?.in_transaction())
    }

    /// Run `func` inside a transaction.
    ///
    /// Commits when `func` returns `Ok`. When it returns `Err` (or panics) the
    /// transaction is rolled back and the original error is returned.
    ///
    /// ```rust
    /// # #[cfg(feature = "sqlite")] {
    /// use simple_db_layer::prelude::*;
    ///
    /// let db = Connection::open("sqlite::memory:");
    /// db.execute_batch("CREATE TABLE t (v INTEGER)")?;
    /// let inserted = db.transaction(|db| db.execute("INSERT INTO t (v) VALUES (?)", params![1]))?;
    /// assert_eq!(inserted, 1);
    /// # }
    /// # Ok::<(), simple_db_layer::DbError>(())
    /// ```
    ///
    /// # Errors
    /// Returns the error from beginning or committing the transaction, or the
    /// error returned by `func`.
    pub fn transaction<T, E, F>(&self, func: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        self.begin_transaction()?;
        let mut guard = RollbackGuard {
            conn: self,
            armed: true,
        };
        match func(self) {
            Ok(value) => {
                self.commit()?;
                guard.armed = false;
                Ok(value)
            }
            Err(err) => {
                guard.armed = false;
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback after failed transaction body failed");
                }
                Err(err)
            }
        }
    }
}

/// Rolls back on drop while armed: covers panics in the transaction body and
/// failed commits.
struct RollbackGuard<'a> {
    conn: &'a Connection,
    armed: bool,
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.conn.rollback() {
            tracing::warn!(error = %err, "implicit transaction rollback failed");
        }
    }
}
