//! Test harness for the mining driver tests.
//!
//! Provides a scripted in-memory [`Connection`] that routes queries by SQL
//! substring, records every statement it is asked to execute, and can be
//! told to fail matching statements, enough to exercise the full session
//! lifecycle without a database server.

// Each integration test binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use async_trait::async_trait;
use redomine::{Connection, ExecutionError, Row, Value};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

/// Initialize test logging (idempotent).
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("redomine=debug".parse().unwrap()),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Scripted connection: queries answer from substring-matched responders,
/// statements are recorded and succeed unless a failure was scripted.
#[derive(Default)]
pub struct MockConnection {
    responders: Vec<(String, Vec<Row>)>,
    statement_failures: Vec<(String, String)>,
    executed: Mutex<Vec<String>>,
    queried: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `pattern` with `rows`. First match wins.
    pub fn on_query(mut self, pattern: &str, rows: Vec<Row>) -> Self {
        self.responders.push((pattern.to_string(), rows));
        self
    }

    /// Fail statements containing `pattern` with `message`.
    pub fn fail_statement(mut self, pattern: &str, message: &str) -> Self {
        self.statement_failures
            .push((pattern.to_string(), message.to_string()));
        self
    }

    /// Every statement executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Executed statements containing `pattern`, in order.
    pub fn executed_matching(&self, pattern: &str) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|s| s.contains(pattern))
            .collect()
    }

    /// Every query run so far, in order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, statement: &str) -> Result<(), ExecutionError> {
        self.executed.lock().unwrap().push(statement.to_string());
        for (pattern, message) in &self.statement_failures {
            if statement.contains(pattern.as_str()) {
                return Err(ExecutionError::statement(message.clone()));
            }
        }
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        self.queried.lock().unwrap().push(sql.to_string());
        for (pattern, rows) in &self.responders {
            if sql.contains(pattern.as_str()) {
                return Ok(rows.clone());
            }
        }
        Ok(Vec::new())
    }
}

/// Candidate row for an archived segment, in selection query column order.
pub fn archived_segment_row(name: &str, first: u64, next: u64, sequence: i64) -> Row {
    Row::new(vec![
        Value::from(name),
        Value::from(first.to_string()),
        Value::from(next.to_string()),
        Value::Null,
        Value::from("ARCHIVED"),
        Value::Int64(sequence),
    ])
}

/// Candidate row for an online segment.
pub fn online_segment_row(name: &str, first: u64, next: u64, status: &str, sequence: i64) -> Row {
    Row::new(vec![
        Value::from(name),
        Value::from(first.to_string()),
        Value::from(next.to_string()),
        Value::from(status),
        Value::from("ONLINE"),
        Value::Int64(sequence),
    ])
}

/// Mining content row, in mining query column order.
pub fn content_row(scn: u64, op: i64, xid: &str, sql: &str, csf: i64) -> Row {
    Row::new(vec![
        Value::from(scn.to_string()),
        Value::Int64(op),
        Value::from(xid),
        Value::from("APP"),
        Value::from("ORDERS"),
        Value::from(sql),
        Value::Int64(csf),
    ])
}

/// One-column row holding a registered file name.
pub fn registered_row(name: &str) -> Row {
    Row::new(vec![Value::from(name)])
}

/// SQL substrings the driver's queries are routed by.
pub mod patterns {
    /// The candidate segment query.
    pub const SELECTION: &str = "ORDER BY 6";
    /// The registered-files listing.
    pub const REGISTERED: &str = "V$LOGMNR_LOGS";
    /// The mining contents query.
    pub const CONTENTS: &str = "V$LOGMNR_CONTENTS";
    /// The segment byte-size sum.
    pub const SEGMENT_BYTES: &str = "SUM(BLOCKS * BLOCK_SIZE)";
    /// The change-number inventory.
    pub const INVENTORY: &str = "FROM DUAL";
    /// The current change number.
    pub const CURRENT_SCN: &str = "CURRENT_SCN";
}
