use std::fmt;
use std::sync::Arc;

use crate::config::ConnectOptions;
use crate::driver::{Driver, DriverConnection, DriverStatement};
use crate::error::DbError;
use crate::types::DriverKind;

use super::config::open_connection;
use super::prepared::SqliteStatement;
use super::worker::{Command, SqliteWorker};

/// Driver for `sqlite:<target>` connection strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn DriverConnection>, DbError> {
        let (kind, target) = options.resolve_driver()?;
        if kind != DriverKind::Sqlite {
            return Err(DbError::connection(format!(
                "sqlite driver cannot open {kind:?} connection strings"
            )));
        }
        let conn = open_connection(options, target)?;
        Ok(Box::new(SqliteDriverConnection::new(conn)?))
    }
}

/// An open `SQLite` database, owned by a dedicated worker thread.
pub struct SqliteDriverConnection {
    pub(crate) worker: Arc<SqliteWorker>,
}

impl SqliteDriverConnection {
    /// Hand `conn` to a new worker thread.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the worker thread cannot be started.
    pub fn new(conn: rusqlite::Connection) -> Result<Self, DbError> {
        Ok(Self {
            worker: Arc::new(SqliteWorker::spawn(conn)?),
        })
    }
}

impl fmt::Debug for SqliteDriverConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriverConnection")
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

impl DriverConnection for SqliteDriverConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DbError> {
        let stmt = SqliteStatement::prepare(Arc::clone(&self.worker), sql)?;
        Ok(Box::new(stmt))
    }

    fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        self.worker.request(|respond_to| Command::ExecuteBatch {
            query: sql.to_owned(),
            respond_to,
        })
    }

    fn last_insert_id(&self, sequence: Option<&str>) -> Result<Option<String>, DbError> {
        if let Some(name) = sequence {
            return Err(DbError::Unimplemented(format!(
                "sqlite has no named sequences (asked for {name:?})"
            )));
        }
        let id = self
            .worker
            .request(|respond_to| Command::LastInsertRowid { respond_to })?;
        Ok((id != 0).then(|| id.to_string()))
    }

    fn quote(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    fn begin_transaction(&self) -> Result<bool, DbError> {
        self.run_transaction_command("BEGIN")
    }

    fn commit(&self) -> Result<bool, DbError> {
        self.run_transaction_command("COMMIT")
    }

    fn rollback(&self) -> Result<bool, DbError> {
        self.run_transaction_command("ROLLBACK")
    }

    fn in_transaction(&self) -> bool {
        self.worker
            .request(|respond_to| Command::IsAutocommit { respond_to })
            .is_ok_and(|autocommit| !autocommit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> SqliteDriverConnection {
        SqliteDriverConnection::new(rusqlite::Connection::open_in_memory().expect("open"))
            .expect("worker")
    }

    #[test]
    fn quotes_embedded_apostrophes() {
        assert_eq!(memory().quote("it's"), "'it''s'");
    }

    #[test]
    fn no_insert_yet_reports_none() {
        assert_eq!(memory().last_insert_id(None).expect("id"), None);
    }

    #[test]
    fn named_sequences_are_unsupported() {
        let err = memory().last_insert_id(Some("users_id_seq")).unwrap_err();
        assert!(matches!(err, DbError::Unimplemented(_)));
    }

    #[test]
    fn last_insert_id_follows_inserts() {
        let conn = memory();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, a); INSERT INTO t (a) VALUES (1), (2);")
            .expect("seed");
        assert_eq!(conn.last_insert_id(None).expect("id"), Some("2".to_owned()));
    }

    #[test]
    fn driver_rejects_unknown_targets() {
        let opts = ConnectOptions::new("sqlite:");
        let err = SqliteDriver.connect(&opts).err().expect("connect should fail");
        assert!(err.is_connection_error());
    }
}
