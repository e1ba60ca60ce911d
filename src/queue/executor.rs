//! SQL Execution Boundary
//!
//! Every queue operation is a single call through [`SqlExecutor`]. The core
//! never talks to a database driver directly; it builds a statement with
//! positional `$n` placeholders plus a list of [`Value`] arguments and hands
//! both to whichever executor was injected. Implementations decide how the
//! statement reaches the backend (connection pool, pinned transaction, test
//! double) and report failures as [`BackendError`], which the core passes
//! through untouched.

use crate::queue::interval::Interval;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// A single positional argument or result column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Interval(Interval),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type label used in decode errors and logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Interval(_) => "interval",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Interval(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Interval> for Value {
    fn from(value: Interval) -> Self {
        Value::Interval(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// One result row: column names in result order, each with its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append, mostly for executors and tests
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// First column value, used for scalar selects
    pub fn first(&self) -> Option<&Value> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.columns.into_iter().map(|(_, value)| value).collect()
    }
}

/// Failure reported by an executor
///
/// Wraps the executor's own error without translating it. `Display` and
/// `source()` forward to the wrapped error; use [`BackendError::downcast_ref`]
/// to inspect driver-specific details.
pub struct BackendError {
    inner: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl BackendError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(error),
        }
    }

    /// Backend error carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            inner: message.into(),
        }
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Debug for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Capability set the queue protocol needs from a SQL backend
///
/// Statements use PostgreSQL positional placeholders (`$1`, `$2`, ...) and
/// `params` are bound in order. Implementations must be shareable across
/// tasks; the protocol holds them as `Arc<dyn SqlExecutor>`.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a statement for its side effects, returning affected rows
    async fn execute(&self, sql: &str, params: &[Value]) -> BackendResult<u64>;

    /// Execute a statement and return every result row
    async fn select_all(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>>;

    /// Execute a statement and return its first row, if any
    async fn select_one(&self, sql: &str, params: &[Value]) -> BackendResult<Option<Row>> {
        Ok(self.select_all(sql, params).await?.into_iter().next())
    }

    /// Execute a statement and return the first column of the first row
    ///
    /// Returns [`Value::Null`] when the statement produced no rows.
    async fn select_value(&self, sql: &str, params: &[Value]) -> BackendResult<Value>;

    /// Execute a statement and return the first column of every row
    async fn select_values(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Value>>;
}
