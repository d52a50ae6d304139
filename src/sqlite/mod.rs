// SQLite driver - the reference implementation of the driver contract
//
// - config: opening the rusqlite connection and applying connection options
// - params: bind-type aware conversion of values into rusqlite values
// - query: extraction of native values out of rusqlite rows
// - connection: the `Driver` / `DriverConnection` implementations
// - prepared: the `DriverStatement` implementation
// - transaction: BEGIN / COMMIT / ROLLBACK forwarding
// - worker: the thread that owns the rusqlite connection and its open cursors

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;
mod transaction;
mod worker;

pub use connection::{SqliteDriver, SqliteDriverConnection};
pub use prepared::SqliteStatement;
