//! A small synchronous database access layer.
//!
//! A [`Connection`] opens its driver connection on first use. Statements are
//! created with [`Connection::prepare`], bound with values whose bind types are
//! inferred from the value itself, and executed lazily. Rows come back in the
//! shape selected by a [`FetchMode`]: whole rows, a single column, key/value
//! maps or groups.
//!
//! ```rust
//! # #[cfg(feature = "sqlite")] {
//! use simple_db_layer::prelude::*;
//!
//! let db = Connection::open("sqlite::memory:");
//! db.execute_batch(
//!     "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT);
//!      INSERT INTO posts (title) VALUES ('first'), ('second');",
//! )?;
//!
//! let mut stmt = db.prepare("SELECT id, title FROM posts WHERE id > ?", params![0])?;
//! stmt.set_fetch_mode(FetchMode::KeyValuePair);
//! let titles = stmt.fetch_all()?.into_pairs().unwrap_or_default();
//! assert_eq!(titles.get(&MapKey::Int(2)), Some(&Value::Text("second".into())));
//! # }
//! # Ok::<(), simple_db_layer::DbError>(())
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod params;
pub mod prelude;
pub mod results;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod statement;
pub mod types;

pub use config::{ConnectOptions, ConnectOptionsBuilder};
pub use connection::{ConnectHook, Connection};
pub use driver::{Driver, DriverConnection, DriverStatement};
pub use error::{DbError, DriverError};
pub use fetch::FetchMode;
pub use params::{BindType, BoundParam, ParamKey, Params, infer_bind_type};
pub use results::{Fetched, FetchedAll, MapKey, Pairs, Projection, Row};
pub use statement::{Rows, Statement, StatementState};
pub use types::{DriverKind, Value};
