use crate::error::DbError;

use super::connection::SqliteDriverConnection;
use super::worker::Command;

impl SqliteDriverConnection {
    /// Forward a transaction control statement; `SQLite` itself rejects
    /// out-of-order commands (nested BEGIN, COMMIT without BEGIN).
    pub(super) fn run_transaction_command(&self, command: &'static str) -> Result<bool, DbError> {
        self.worker.request(|respond_to| Command::TransactionControl {
            command,
            respond_to,
        })?;
        Ok(true)
    }
}
