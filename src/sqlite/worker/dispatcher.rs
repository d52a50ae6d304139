use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use rusqlite::types::Value as SqliteValue;

use crate::error::DbError;
use crate::params::ParamKey;
use crate::results::Row;
use crate::sqlite::query::{build_row, column_names};

use super::channel::{Command, CursorId, Executed, PreparedInfo, Respond};

/// Rows of cursors that had to leave the worker stack before they were drained.
type Parked = HashMap<CursorId, VecDeque<Result<Row, DbError>>>;

enum Flow {
    Continue,
    Shutdown,
    /// Addressed to a cursor further down the stack; hand it back to the caller.
    Unwind(Command),
}

pub(super) fn run_sqlite_worker(conn: &rusqlite::Connection, receiver: &Receiver<Command>) {
    let mut parked = Parked::new();
    let mut live = Vec::new();
    let mut pending = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };
        match dispatch(conn, receiver, &mut parked, &mut live, command) {
            Flow::Continue => {}
            Flow::Shutdown => break,
            Flow::Unwind(command) => pending = Some(command),
        }
    }
}

fn dispatch(
    conn: &rusqlite::Connection,
    receiver: &Receiver<Command>,
    parked: &mut Parked,
    live: &mut Vec<CursorId>,
    command: Command,
) -> Flow {
    match command {
        Command::Shutdown => return Flow::Shutdown,
        Command::ExecuteBatch { query, respond_to } => {
            let _ = respond_to.send(conn.execute_batch(&query).map_err(DbError::query));
        }
        Command::TransactionControl {
            command,
            respond_to,
        } => {
            let _ = respond_to.send(conn.execute_batch(command).map_err(DbError::transaction));
        }
        Command::Prepare { query, respond_to } => {
            let _ = respond_to.send(prepare(conn, &query));
        }
        Command::Execute {
            cursor,
            query,
            bindings,
            respond_to,
        } => {
            parked.remove(&cursor);
            return execute(
                conn,
                receiver,
                parked,
                live,
                (cursor, &query, &bindings),
                respond_to,
            );
        }
        Command::FetchNext { cursor, respond_to } => {
            let next = match parked.get_mut(&cursor).and_then(VecDeque::pop_front) {
                Some(item) => item.map(Some),
                None => {
                    parked.remove(&cursor);
                    Ok(None)
                }
            };
            let _ = respond_to.send(next);
        }
        Command::FetchRemaining { cursor, respond_to } => {
            let rows = parked.remove(&cursor).unwrap_or_default();
            let _ = respond_to.send(rows.into_iter().collect());
        }
        Command::CloseCursor { cursor } => {
            parked.remove(&cursor);
        }
        Command::LastInsertRowid { respond_to } => {
            let _ = respond_to.send(Ok(conn.last_insert_rowid()));
        }
        Command::IsAutocommit { respond_to } => {
            let _ = respond_to.send(Ok(conn.is_autocommit()));
        }
    }
    Flow::Continue
}

fn prepare(conn: &rusqlite::Connection, query: &str) -> Result<PreparedInfo, DbError> {
    let stmt = conn.prepare_cached(query).map_err(DbError::query)?;
    Ok(PreparedInfo {
        columns: column_names(&stmt),
        parameter_count: stmt.parameter_count(),
    })
}

fn execute(
    conn: &rusqlite::Connection,
    receiver: &Receiver<Command>,
    parked: &mut Parked,
    live: &mut Vec<CursorId>,
    (cursor, query, bindings): (CursorId, &str, &[(ParamKey, SqliteValue)]),
    respond_to: Respond<Executed>,
) -> Flow {
    let mut stmt = match conn.prepare_cached(query) {
        Ok(stmt) => stmt,
        Err(err) => {
            let _ = respond_to.send(Err(DbError::query(err)));
            return Flow::Continue;
        }
    };
    if let Err(err) = bind(&mut stmt, bindings) {
        let _ = respond_to.send(Err(err));
        return Flow::Continue;
    }

    if stmt.column_count() == 0 {
        let outcome = stmt
            .raw_execute()
            .map(|changes| Executed::Changes(changes as u64))
            .map_err(DbError::query);
        let _ = respond_to.send(outcome);
        return Flow::Continue;
    }

    // The first step re-prepares a statement invalidated by a schema change, so
    // column names are read after it.
    let mut rows = stmt.raw_query();
    let first = match rows.next() {
        Ok(Some(row)) => {
            let columns = column_names(row.as_ref());
            build_row(row, &columns).map(|row| Some((columns, row)))
        }
        Ok(None) => Ok(None),
        Err(err) => Err(DbError::query(err)),
    };

    match first {
        Err(err) => {
            let _ = respond_to.send(Err(err));
            Flow::Continue
        }
        Ok(None) => {
            drop(rows);
            let columns = column_names(&stmt);
            let _ = respond_to.send(Ok(Executed::Rows { columns }));
            Flow::Continue
        }
        Ok(Some((columns, row))) => {
            let _ = respond_to.send(Ok(Executed::Rows {
                columns: Arc::clone(&columns),
            }));
            live.push(cursor);
            let flow = run_cursor_loop(
                conn,
                receiver,
                parked,
                live,
                LiveCursor {
                    id: cursor,
                    rows,
                    columns,
                    lookahead: Some(row),
                },
            );
            live.pop();
            flow
        }
    }
}

fn bind(stmt: &mut rusqlite::Statement<'_>, bindings: &[(ParamKey, SqliteValue)]) -> Result<(), DbError> {
    for (key, value) in bindings {
        let idx = resolve_index(stmt, key)?;
        stmt.raw_bind_parameter(idx, value).map_err(DbError::query)?;
    }
    Ok(())
}

fn resolve_index(stmt: &rusqlite::Statement<'_>, key: &ParamKey) -> Result<usize, DbError> {
    match key {
        ParamKey::Position(idx) => {
            if *idx == 0 || *idx > stmt.parameter_count() {
                return Err(DbError::ParameterError(format!(
                    "parameter position {idx} out of range (statement has {})",
                    stmt.parameter_count()
                )));
            }
            Ok(*idx)
        }
        ParamKey::Name(name) => {
            let found = stmt.parameter_index(name).map_err(DbError::query)?;
            let found = match found {
                Some(idx) => Some(idx),
                None if !name.starts_with([':', '@', '$']) => stmt
                    .parameter_index(&format!(":{name}"))
                    .map_err(DbError::query)?,
                None => None,
            };
            found.ok_or_else(|| DbError::ParameterError(format!("unknown named parameter {name:?}")))
        }
    }
}

/// A cursor stepping on the worker stack, one row per request.
struct LiveCursor<'s> {
    id: CursorId,
    rows: rusqlite::Rows<'s>,
    columns: Arc<Vec<String>>,
    lookahead: Option<Row>,
}

impl LiveCursor<'_> {
    fn next_row(&mut self) -> Result<Option<Row>, DbError> {
        if let Some(row) = self.lookahead.take() {
            return Ok(Some(row));
        }
        match self.rows.next().map_err(DbError::query)? {
            Some(row) => build_row(row, &self.columns).map(Some),
            None => Ok(None),
        }
    }

    fn remaining(&mut self) -> Result<Vec<Row>, DbError> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Buffer what is left, keeping a failing row as the final entry.
    fn park(mut self, parked: &mut Parked) {
        let mut buffered = VecDeque::new();
        loop {
            match self.next_row() {
                Ok(Some(row)) => buffered.push_back(Ok(row)),
                Ok(None) => break,
                Err(err) => {
                    buffered.push_back(Err(err));
                    break;
                }
            }
        }
        parked.insert(self.id, buffered);
    }
}

/// Serve commands while `cursor` is open. Commands for other cursors and for
/// the connection are dispatched from here; a command for a cursor that is
/// still open further down the stack parks this one first.
fn run_cursor_loop(
    conn: &rusqlite::Connection,
    receiver: &Receiver<Command>,
    parked: &mut Parked,
    live: &mut Vec<CursorId>,
    mut cursor: LiveCursor<'_>,
) -> Flow {
    let mut pending = None;
    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => return Flow::Shutdown,
            },
        };
        match command.cursor() {
            Some(id) if id == cursor.id => match command {
                Command::FetchNext { respond_to, .. } => {
                    let next = cursor.next_row();
                    let done = !matches!(next, Ok(Some(_)));
                    let _ = respond_to.send(next);
                    if done {
                        return Flow::Continue;
                    }
                }
                Command::FetchRemaining { respond_to, .. } => {
                    let _ = respond_to.send(cursor.remaining());
                    return Flow::Continue;
                }
                Command::CloseCursor { .. } => return Flow::Continue,
                // re-execution starts over once this cursor has left the stack
                other => return Flow::Unwind(other),
            },
            Some(id) if live.contains(&id) => {
                cursor.park(parked);
                return Flow::Unwind(command);
            }
            _ => match dispatch(conn, receiver, parked, live, command) {
                Flow::Continue => {}
                Flow::Shutdown => return Flow::Shutdown,
                Flow::Unwind(command) => pending = Some(command),
            },
        }
    }
}
