#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use simple_db_layer::config::ConnectOptions;
use simple_db_layer::driver::{Driver, DriverConnection, DriverStatement};
use simple_db_layer::params::{BindType, ParamKey};
use simple_db_layer::{Connection, DbError, Row, Value};

/// Text value the fake statement refuses to bind.
pub const REJECTED: &str = "reject";

/// Driver call observed by the fake driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Prepare(String),
    Bind(ParamKey, Value, BindType),
    ClearBindings,
    Execute,
    CloseCursor,
    Begin,
    Commit,
    Rollback,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Canned result every statement prepared through [`FakeDriver`] produces.
#[derive(Debug, Clone, Default)]
pub struct Canned {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Canned {
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows,
        }
    }
}

/// In-process driver that records every call it receives.
pub struct FakeDriver {
    pub log: CallLog,
    pub canned: Canned,
    pub connect_failures: Rc<Cell<u32>>,
}

impl FakeDriver {
    pub fn new(canned: Canned) -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            canned,
            connect_failures: Rc::new(Cell::new(0)),
        }
    }

    /// Connection wired to this driver, plus the shared call log.
    pub fn connection(canned: Canned) -> (Connection, CallLog) {
        let driver = Self::new(canned);
        let log = Rc::clone(&driver.log);
        let conn = Connection::with_driver(ConnectOptions::new("fake:test"), Box::new(driver));
        (conn, log)
    }
}

impl Driver for FakeDriver {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn connect(&self, _options: &ConnectOptions) -> Result<Box<dyn DriverConnection>, DbError> {
        self.log.borrow_mut().push(Call::Connect);
        let remaining = self.connect_failures.get();
        if remaining > 0 {
            self.connect_failures.set(remaining - 1);
            return Err(DbError::connection("fake database unreachable"));
        }
        Ok(Box::new(FakeConnection {
            log: Rc::clone(&self.log),
            canned: self.canned.clone(),
            in_tx: Cell::new(false),
        }))
    }
}

pub struct FakeConnection {
    log: CallLog,
    canned: Canned,
    in_tx: Cell<bool>,
}

impl DriverConnection for FakeConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DbError> {
        self.log.borrow_mut().push(Call::Prepare(sql.to_string()));
        if sql.contains("SYNTAX ERROR") {
            return Err(DbError::query("near \"SYNTAX\": syntax error"));
        }
        Ok(Box::new(FakeStatement {
            log: Rc::clone(&self.log),
            columns: Arc::new(self.canned.columns.clone()),
            rows: self.canned.rows.clone(),
            cursor: VecDeque::new(),
            executed: 0,
        }))
    }

    fn execute_batch(&self, _sql: &str) -> Result<(), DbError> {
        Ok(())
    }

    fn last_insert_id(&self, _sequence: Option<&str>) -> Result<Option<String>, DbError> {
        Ok(Some("42".to_string()))
    }

    fn quote(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    fn begin_transaction(&self) -> Result<bool, DbError> {
        self.log.borrow_mut().push(Call::Begin);
        if self.in_tx.replace(true) {
            return Err(DbError::transaction("transaction already active"));
        }
        Ok(true)
    }

    fn commit(&self) -> Result<bool, DbError> {
        self.log.borrow_mut().push(Call::Commit);
        if !self.in_tx.replace(false) {
            return Err(DbError::transaction("no active transaction"));
        }
        Ok(true)
    }

    fn rollback(&self) -> Result<bool, DbError> {
        self.log.borrow_mut().push(Call::Rollback);
        if !self.in_tx.replace(false) {
            return Err(DbError::transaction("no active transaction"));
        }
        Ok(true)
    }

    fn in_transaction(&self) -> bool {
        self.in_tx.get()
    }
}

pub struct FakeStatement {
    log: CallLog,
    columns: Arc<Vec<String>>,
    rows: Vec<Vec<Value>>,
    cursor: VecDeque<Row>,
    executed: u64,
}

impl DriverStatement for FakeStatement {
    fn bind_parameter(
        &mut self,
        key: &ParamKey,
        value: &Value,
        bind_type: BindType,
    ) -> Result<(), DbError> {
        self.log
            .borrow_mut()
            .push(Call::Bind(key.clone(), value.clone(), bind_type));
        if *value == Value::Text(REJECTED.into()) {
            return Err(DbError::ParameterError(format!("driver refused {key:?}")));
        }
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.log.borrow_mut().push(Call::ClearBindings);
    }

    fn execute(&mut self) -> Result<bool, DbError> {
        self.log.borrow_mut().push(Call::Execute);
        self.executed += 1;
        self.cursor = self
            .rows
            .iter()
            .map(|values| Row::new(Arc::clone(&self.columns), values.clone()))
            .collect();
        Ok(true)
    }

    fn fetch_next(&mut self) -> Result<Option<Row>, DbError> {
        Ok(self.cursor.pop_front())
    }

    fn fetch_all_remaining(&mut self) -> Result<Vec<Row>, DbError> {
        Ok(self.cursor.drain(..).collect())
    }

    fn column_names(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }

    fn row_count(&self) -> u64 {
        if self.executed == 0 { 0 } else { self.rows.len() as u64 }
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn close_cursor(&mut self) {
        self.log.borrow_mut().push(Call::CloseCursor);
        self.cursor.clear();
    }
}

/// Calls recorded so far, excluding cursor releases.
pub fn calls(log: &CallLog) -> Vec<Call> {
    log.borrow()
        .iter()
        .filter(|call| **call != Call::CloseCursor)
        .cloned()
        .collect()
}
