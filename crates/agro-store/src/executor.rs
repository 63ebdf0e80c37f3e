//! # Query-Executor Boundary
//!
//! The stores talk to the database only through [`Database`] and
//! [`Session`]: a session accepts a statement with positional parameters
//! and returns its rows and row count. Transactions are controlled by
//! sending the literal statements `BEGIN`, `COMMIT` and `ROLLBACK` through
//! the same session; there is no separate transaction object.
//!
//! A [`Database`] hands out one [`Session`] per logical store operation so
//! that every statement of a transaction runs on the same connection.

use async_trait::async_trait;

use crate::error::DbError;

/// Parameter type, used to give nulls a concrete Postgres type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Double,
    Text,
    Bool,
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    IntArray(Vec<i64>),
    TextArray(Vec<String>),
    Null(SqlType),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<i64>> for SqlParam {
    fn from(v: Vec<i64>) -> Self {
        Self::IntArray(v)
    }
}

impl From<Vec<String>> for SqlParam {
    fn from(v: Vec<String>) -> Self {
        Self::TextArray(v)
    }
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Json(serde_json::Value),
}

/// One result row: column labels in select order, with their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Builder used by fakes and tests.
    pub fn with(mut self, column: &str, value: SqlValue) -> Self {
        self.columns.push((column.to_string(), value));
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&SqlValue, DbError> {
        self.get(column)
            .ok_or_else(|| DbError::decode(column, "column not present"))
    }

    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>, DbError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v)),
            other => Err(DbError::decode(column, format!("expected integer, got {other:?}"))),
        }
    }

    pub fn i64(&self, column: &str) -> Result<i64, DbError> {
        self.opt_i64(column)?
            .ok_or_else(|| DbError::decode(column, "unexpected null"))
    }

    /// Floats accept integer columns too, so `SUM` over either decodes.
    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>, DbError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Float(v) => Ok(Some(*v)),
            SqlValue::Int(v) => Ok(Some(*v as f64)),
            other => Err(DbError::decode(column, format!("expected number, got {other:?}"))),
        }
    }

    pub fn f64(&self, column: &str) -> Result<f64, DbError> {
        self.opt_f64(column)?
            .ok_or_else(|| DbError::decode(column, "unexpected null"))
    }

    pub fn opt_str(&self, column: &str) -> Result<Option<&str>, DbError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.as_str())),
            other => Err(DbError::decode(column, format!("expected text, got {other:?}"))),
        }
    }

    pub fn str(&self, column: &str) -> Result<&str, DbError> {
        self.opt_str(column)?
            .ok_or_else(|| DbError::decode(column, "unexpected null"))
    }

    pub fn opt_bool(&self, column: &str) -> Result<Option<bool>, DbError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Bool(v) => Ok(Some(*v)),
            other => Err(DbError::decode(column, format!("expected bool, got {other:?}"))),
        }
    }

    pub fn opt_json(&self, column: &str) -> Result<Option<&serde_json::Value>, DbError> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Json(v) => Ok(Some(v)),
            other => Err(DbError::decode(column, format!("expected json, got {other:?}"))),
        }
    }
}

/// Rows returned by a statement, plus how many there were.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: u64,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let row_count = rows.len() as u64;
        Self { rows, row_count }
    }

    /// A result with no rows, as returned by `BEGIN` or a plain `DELETE`.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One of the three literal transaction-control statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionControl {
    Begin,
    Commit,
    Rollback,
}

impl TransactionControl {
    /// Recognize `BEGIN`, `COMMIT` or `ROLLBACK`, ignoring case, surrounding
    /// whitespace and a trailing semicolon.
    pub fn parse(sql: &str) -> Option<Self> {
        match sql.trim().trim_end_matches(';').to_ascii_uppercase().as_str() {
            "BEGIN" => Some(Self::Begin),
            "COMMIT" => Some(Self::Commit),
            "ROLLBACK" => Some(Self::Rollback),
            _ => None,
        }
    }
}

/// Transaction bookkeeping for one session.
///
/// A connection must not return to the pool while a transaction it opened
/// is still open, while a statement was cut off mid-flight, or after a
/// `ROLLBACK` failed. Sessions consult [`TransactionState::must_discard`]
/// when dropped and close their connection instead of recycling it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionState {
    open: bool,
    in_flight: bool,
    interrupted: bool,
}

impl TransactionState {
    /// Call before awaiting a statement.
    pub fn started(&mut self) {
        self.in_flight = true;
    }

    /// Call once a statement has returned.
    pub fn finished(&mut self, sql: &str, outcome: &Result<QueryResult, DbError>) {
        self.in_flight = false;
        if matches!(outcome, Err(DbError::Timeout(_))) {
            self.interrupted = true;
        }
        match (TransactionControl::parse(sql), outcome.is_ok()) {
            (Some(TransactionControl::Begin), true) => self.open = true,
            (Some(TransactionControl::Commit), true) => self.open = false,
            (Some(TransactionControl::Rollback), true) => self.open = false,
            (Some(TransactionControl::Rollback), false) => self.interrupted = true,
            _ => {}
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn must_discard(&self) -> bool {
        self.open || self.in_flight || self.interrupted
    }
}

/// A single connection checked out for the duration of one store operation.
#[async_trait]
pub trait Session: Send {
    /// Run one statement with positional `$n` parameters.
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, DbError>;
}

/// Source of sessions.
#[async_trait]
pub trait Database: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn Session>, DbError>;
}
