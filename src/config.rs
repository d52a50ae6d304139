use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::error::DbError;
use crate::types::DriverKind;

lazy_static! {
    static ref DSN_RE: Regex =
        Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*):(?P<target>.*)$")
            .unwrap_or_else(|e| panic!("invalid DSN pattern: {e}"));
}

/// Connection string plus optional credentials and driver options.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub dsn: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ConnectOptions {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            username: None,
            password: None,
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn builder(dsn: impl Into<String>) -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::new(dsn)
    }

    /// Load options from a JSON document such as
    /// `{"dsn": "sqlite::memory:", "options": {"busy_timeout": "500"}}`.
    ///
    /// # Errors
    /// Returns `DbError::ConfigError` if the document is not valid JSON or lacks `dsn`.
    pub fn from_json_str(json: &str) -> Result<Self, DbError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Split the DSN into its driver and driver-specific target.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionError` if the DSN has no scheme or names an unknown driver.
    pub fn resolve_driver(&self) -> Result<(DriverKind, &str), DbError> {
        parse_dsn(&self.dsn)
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("dsn", &self.dsn)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish()
    }
}

/// Parse `<scheme>:<target>` and map the scheme onto a compiled-in driver.
///
/// # Errors
/// Returns `DbError::ConnectionError` if the DSN is malformed or the scheme is unknown.
pub fn parse_dsn(dsn: &str) -> Result<(DriverKind, &str), DbError> {
    let caps = DSN_RE
        .captures(dsn)
        .ok_or_else(|| DbError::connection(format!("malformed connection string: {dsn:?}")))?;
    let scheme = caps.name("scheme").map_or("", |m| m.as_str());
    let target = caps.name("target").map_or("", |m| m.as_str());
    let kind = DriverKind::from_str(scheme, true)
        .map_err(|_| DbError::connection(format!("unsupported driver scheme: {scheme:?}")))?;
    Ok((kind, target))
}

/// Fluent builder for [`ConnectOptions`].
#[derive(Debug, Clone)]
pub struct ConnectOptionsBuilder {
    opts: ConnectOptions,
}

impl ConnectOptionsBuilder {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            opts: ConnectOptions::new(dsn),
        }
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.opts.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectOptions {
        self.opts
    }

    /// Build a [`Connection`]; the driver connection itself is opened on first use.
    #[must_use]
    pub fn connect(self) -> Connection {
        Connection::new(self.finish())
    }
}
