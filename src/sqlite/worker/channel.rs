use std::sync::Arc;
use std::sync::mpsc::Sender;

use rusqlite::types::Value as SqliteValue;

use crate::error::DbError;
use crate::params::ParamKey;
use crate::results::Row;

pub(crate) type CursorId = u64;
pub(crate) type Respond<T> = Sender<Result<T, DbError>>;

/// What the worker learned while preparing a statement.
#[derive(Debug, Clone)]
pub(crate) struct PreparedInfo {
    pub(crate) columns: Arc<Vec<String>>,
    pub(crate) parameter_count: usize,
}

/// Outcome of running a statement on the worker.
#[derive(Debug, Clone)]
pub(crate) enum Executed {
    /// A cursor is open on the worker; columns as of this execution
    Rows { columns: Arc<Vec<String>> },
    /// No result columns; number of affected rows
    Changes(u64),
}

pub(crate) enum Command {
    ExecuteBatch {
        query: String,
        respond_to: Respond<()>,
    },
    TransactionControl {
        command: &'static str,
        respond_to: Respond<()>,
    },
    Prepare {
        query: Arc<String>,
        respond_to: Respond<PreparedInfo>,
    },
    Execute {
        cursor: CursorId,
        query: Arc<String>,
        bindings: Vec<(ParamKey, SqliteValue)>,
        respond_to: Respond<Executed>,
    },
    FetchNext {
        cursor: CursorId,
        respond_to: Respond<Option<Row>>,
    },
    FetchRemaining {
        cursor: CursorId,
        respond_to: Respond<Vec<Row>>,
    },
    CloseCursor {
        cursor: CursorId,
    },
    LastInsertRowid {
        respond_to: Respond<i64>,
    },
    IsAutocommit {
        respond_to: Respond<bool>,
    },
    Shutdown,
}

impl Command {
    /// Cursor the command is addressed to, if any.
    pub(crate) fn cursor(&self) -> Option<CursorId> {
        match self {
            Command::Execute { cursor, .. }
            | Command::FetchNext { cursor, .. }
            | Command::FetchRemaining { cursor, .. }
            | Command::CloseCursor { cursor } => Some(*cursor),
            _ => None,
        }
    }
}
