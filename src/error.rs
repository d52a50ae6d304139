use thiserror::Error;

/// Boxed error raised by a driver; kept intact as the `source` of a [`DbError`].
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    ConnectionError(#[source] DriverError),

    #[error("Query error: {0}")]
    QueryError(#[source] DriverError),

    #[error("Transaction error: {0}")]
    TransactionError(#[source] DriverError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    #[error("Fetch mode error: {0}")]
    FetchModeError(String),

    #[error("Statement has been closed")]
    StatementClosed,

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl DbError {
    pub fn connection(err: impl Into<DriverError>) -> Self {
        DbError::ConnectionError(err.into())
    }

    pub fn query(err: impl Into<DriverError>) -> Self {
        DbError::QueryError(err.into())
    }

    pub fn transaction(err: impl Into<DriverError>) -> Self {
        DbError::TransactionError(err.into())
    }

    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionError(_))
    }

    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, DbError::QueryError(_))
    }

    #[must_use]
    pub fn is_transaction_error(&self) -> bool {
        matches!(self, DbError::TransactionError(_))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::ConfigError(err.to_string())
    }
}
