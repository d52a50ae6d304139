//! Convenient imports for common functionality.
//!
//! `use simple_db_layer::prelude::*;` brings in the connection, statement and
//! result types together with the `params!` macro.

pub use crate::config::ConnectOptions;
pub use crate::connection::Connection;
pub use crate::error::DbError;
pub use crate::fetch::FetchMode;
pub use crate::params::{BindType, Params};
pub use crate::params;
pub use crate::results::{Fetched, FetchedAll, MapKey, Pairs, Projection, Row};
pub use crate::statement::{Statement, StatementState};
pub use crate::types::Value;
