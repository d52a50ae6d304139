mod channel;
mod dispatcher;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::error::DbError;

pub(crate) use channel::{Command, CursorId, Executed, Respond};

/// Handle to the thread that owns a rusqlite connection.
///
/// Every statement of a connection talks to the same worker, which keeps open
/// cursors stepping on its own stack between requests.
pub(crate) struct SqliteWorker {
    sender: Sender<Command>,
    handle: Option<JoinHandle<()>>,
    next_cursor: AtomicU64,
}

impl SqliteWorker {
    /// # Errors
    /// Returns `DbError::ConnectionError` if the worker thread cannot be started.
    pub(crate) fn spawn(conn: rusqlite::Connection) -> Result<Self, DbError> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("sqlite-worker".into())
            .spawn(move || dispatcher::run_sqlite_worker(&conn, &receiver))
            .map_err(|err| DbError::connection(format!("failed to spawn sqlite worker: {err}")))?;
        Ok(Self {
            sender,
            handle: Some(handle),
            next_cursor: AtomicU64::new(1),
        })
    }

    pub(crate) fn next_cursor_id(&self) -> CursorId {
        self.next_cursor.fetch_add(1, Ordering::Relaxed)
    }

    /// Send a command and wait for its reply.
    ///
    /// # Errors
    /// Returns the worker's error, or `DbError::ConnectionError` if the worker
    /// is no longer running.
    pub(crate) fn request<T>(&self, build: impl FnOnce(Respond<T>) -> Command) -> Result<T, DbError> {
        let (respond_to, response) = mpsc::channel();
        self.send(build(respond_to))?;
        response.recv().map_err(|_| worker_gone())?
    }

    /// Send a command that has no reply.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the worker is no longer running.
    pub(crate) fn send(&self, command: Command) -> Result<(), DbError> {
        self.sender.send(command).map_err(|_| worker_gone())
    }

    #[cfg(test)]
    pub(crate) fn shutdown(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_gone() -> DbError {
    DbError::connection("sqlite worker is no longer running")
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sqlite worker thread panicked");
            }
        }
    }
}
