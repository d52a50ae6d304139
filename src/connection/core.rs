use std::cell::{OnceCell, RefCell};
use std::fmt;

use crate::config::ConnectOptions;
use crate::driver::{Driver, DriverConnection};
use crate::error::DbError;
use crate::params::Params;
use crate::statement::Statement;

/// Hook run against every freshly opened driver connection.
pub type ConnectHook = Box<dyn Fn(&dyn DriverConnection) -> Result<(), DbError>>;

/// Owns one lazily opened driver connection.
///
/// Nothing is opened until an operation needs the database; the handle is then
/// kept for the lifetime of the `Connection`. A `Connection` is meant for one
/// caller at a time and cannot be shared across threads.
pub struct Connection {
    options: ConnectOptions,
    driver: Option<Box<dyn Driver>>,
    on_connect: Option<ConnectHook>,
    handle: OnceCell<Box<dyn DriverConnection>>,
    last_query: RefCell<Option<String>>,
}

impl Connection {
    /// Connection whose driver is picked from the DSN scheme on first use.
    #[must_use]
    pub fn new(options: ConnectOptions) -> Self {
        Self {
            options,
            driver: None,
            on_connect: None,
            handle: OnceCell::new(),
            last_query: RefCell::new(None),
        }
    }

    /// Shorthand for `Connection::new(ConnectOptions::new(dsn))`.
    #[must_use]
    pub fn open(dsn: impl Into<String>) -> Self {
        Self::new(ConnectOptions::new(dsn))
    }

    /// Connection that always opens through `driver`.
    #[must_use]
    pub fn with_driver(options: ConnectOptions, driver: Box<dyn Driver>) -> Self {
        Self {
            driver: Some(driver),
            ..Self::new(options)
        }
    }

    /// Run `hook` once each time a driver connection is established, before it
    /// is used. A failing hook discards that driver connection.
    #[must_use]
    pub fn on_connect<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn DriverConnection) -> Result<(), DbError> + 'static,
    {
        self.on_connect = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.get().is_some()
    }

    /// The driver connection, opening it on first call.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the DSN is malformed or the database
    /// cannot be reached, or the hook's error if the post-connect hook fails.
    pub fn driver_connection(&self) -> Result<&dyn DriverConnection, DbError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle.as_ref());
        }
        let handle = self.connect()?;
        Ok(self.handle.get_or_init(|| handle).as_ref())
    }

    fn connect(&self) -> Result<Box<dyn DriverConnection>, DbError> {
        let handle = match &self.driver {
            Some(driver) => {
                tracing::debug!(driver = driver.name(), dsn = %self.options.dsn, "opening connection");
                driver.connect(&self.options)?
            }
            None => {
                let (kind, _) = self.options.resolve_driver()?;
                let driver = kind.driver();
                tracing::debug!(driver = driver.name(), dsn = %self.options.dsn, "opening connection");
                driver.connect(&self.options)?
            }
        };
        if let Some(hook) = &self.on_connect {
            hook(handle.as_ref())?;
        }
        Ok(handle)
    }

    /// Create a statement for `sql`. No driver work happens until the statement
    /// is executed or read from.
    ///
    /// # Errors
    /// Returns `DbError::QueryError` if `sql` is blank.
    pub fn prepare(&self, sql: &str, params: impl Into<Params>) -> Result<Statement<'_>, DbError> {
        if sql.trim().is_empty() {
            return Err(DbError::query("cannot prepare an empty SQL statement"));
        }
        self.last_query.replace(Some(sql.to_owned()));
        Ok(Statement::new(self, sql.to_owned(), &params.into()))
    }

    /// SQL text of the most recently prepared statement.
    #[must_use]
    pub fn last_query(&self) -> Option<String> {
        self.last_query.borrow().clone()
    }

    /// Run one or more parameterless statements.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        self.driver_connection()?.execute_batch(sql)
    }

    /// Most recent auto-generated row id, 0 when the driver reports none.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the connection cannot be opened.
    pub fn last_insert_id(&self) -> Result<i64, DbError> {
        self.last_insert_id_for(None)
    }

    /// Like [`last_insert_id`](Self::last_insert_id), for drivers that track ids per sequence.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the connection cannot be opened, or
    /// `DbError::Unimplemented` if the driver has no named sequences.
    pub fn last_insert_id_for(&self, sequence: Option<&str>) -> Result<i64, DbError> {
        let id = self.driver_connection()?.last_insert_id(sequence)?;
        Ok(id.and_then(|id| id.parse().ok()).unwrap_or(0))
    }

    /// Quote `text` as a string literal for the connected driver.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the connection cannot be opened.
    pub fn quote(&self, text: &str) -> Result<String, DbError> {
        Ok(self.driver_connection()?.quote(text))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("driver", &self.driver.as_ref().map(|d| d.name()))
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
