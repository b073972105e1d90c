//! Connection seam between the mining driver and the database server.
//!
//! The driver never speaks a wire protocol itself; it issues administrative
//! statements and tabular queries through [`Connection`]. Implementations own
//! authentication, pooling, and reconnection policy; a connection found
//! closed is expected to be lazily re-established before the operation runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by a [`Connection`] operation.
///
/// Vendor error codes (e.g. `ORA-01307`) travel inside the message, the way
/// the server reports them; [`ExecutionError::has_vendor_code`] matches them
/// without parsing the rest of the text.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A non-query administrative statement failed.
    #[error("statement failed: {message}")]
    Statement { message: String },

    /// A query failed to execute or deliver rows.
    #[error("query failed: {message}")]
    Query { message: String },

    /// The connection was lost and could not be re-established.
    #[error("connection lost: {message}")]
    ConnectionLost { message: String },
}

impl ExecutionError {
    /// Create a statement failure.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    /// Create a query failure.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a lost-connection failure.
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost {
            message: message.into(),
        }
    }

    /// The raw server message.
    pub fn message(&self) -> &str {
        match self {
            Self::Statement { message } | Self::Query { message } | Self::ConnectionLost { message } => {
                message
            }
        }
    }

    /// Whether the server message carries the given vendor error code.
    pub fn has_vendor_code(&self, code: &str) -> bool {
        self.message().to_uppercase().contains(&code.to_uppercase())
    }

    /// Whether retrying the operation on a fresh connection may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }
}

/// A single tabular value.
///
/// The mining views deliver change numbers as text (they exceed the signed
/// integer range of some client stacks), so the variants stay deliberately
/// small: what the driver's queries actually produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// SQL NULL
    Null,
    /// Signed 64-bit integer
    Int64(i64),
    /// Text
    String(String),
}

impl Value {
    /// Check if the value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as text, if textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as a signed integer, if numeric.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Read as an unsigned 64-bit integer: numeric values must be
    /// non-negative, textual values must parse.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int64(v) => u64::try_from(*v).ok(),
            Self::String(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// One result row, addressed positionally in query column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Build a row from column values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Value at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Text at `index`; `None` for NULL, missing, or non-text columns.
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Signed integer at `index`.
    pub fn i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_i64)
    }

    /// Unsigned integer at `index` (numeric or parseable text).
    pub fn u64(&self, index: usize) -> Option<u64> {
        self.get(index).and_then(Value::as_u64)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// A server connection used by the mining driver.
///
/// The driver assumes exclusive use of one connection for the duration of a
/// full session lifecycle and issues every operation sequentially.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a non-query administrative statement.
    async fn execute(&self, statement: &str) -> Result<(), ExecutionError>;

    /// Run a query and return all rows in result order. Consumption is
    /// forward-only; the driver never revisits a row.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, ExecutionError>;
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for &C {
    async fn execute(&self, statement: &str) -> Result<(), ExecutionError> {
        (**self).execute(statement).await
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        (**self).query(sql).await
    }
}
