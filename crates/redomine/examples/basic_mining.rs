//! Basic mining walkthrough.
//!
//! Drives a full session lifecycle against an in-memory connection that
//! answers the driver's queries from canned rows, so the example runs
//! without a database server. Swap `CannedConnection` for a real
//! `Connection` implementation to mine a live log stream.
//!
//! Run with:
//! ```
//! cargo run --example basic_mining
//! ```

use async_trait::async_trait;
use redomine::{
    Connection, ExecutionError, MinerConfig, MiningSession, MiningWindow, Row, Scn, Value,
};

/// Answers selection and mining queries from canned rows; accepts every
/// administrative statement.
struct CannedConnection;

#[async_trait]
impl Connection for CannedConnection {
    async fn execute(&self, statement: &str) -> Result<(), ExecutionError> {
        println!("server <- {statement}");
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        if sql.contains("ORDER BY 6") {
            // Candidate segments: two archived, one current online
            return Ok(vec![
                segment_row("arch_10.log", "13000000", "13200000", None, "ARCHIVED", 10),
                segment_row("arch_11.log", "13200000", "14800000", None, "ARCHIVED", 11),
                segment_row(
                    "redo_12.log",
                    "14800000",
                    "15000000",
                    Some("CURRENT"),
                    "ONLINE",
                    12,
                ),
            ]);
        }
        if sql.contains("V$LOGMNR_CONTENTS") {
            // One insert split across two rows, then its commit
            return Ok(vec![
                content_row(13_196_100, 1, "INSERT INTO orders (id, note) ", 1),
                content_row(13_196_100, 1, "VALUES (42, 'first')", 0),
                content_row(13_196_101, 7, "commit", 0),
            ]);
        }
        if sql.contains("FROM DUAL") {
            return Ok(vec![Row::new(vec![
                Value::from("12000000"),
                Value::from("14800000"),
                Value::from("15000000"),
            ])]);
        }
        if sql.contains("CURRENT_SCN") {
            return Ok(vec![Row::new(vec![Value::from("15000123")])]);
        }
        Ok(Vec::new())
    }
}

fn segment_row(
    name: &str,
    first: &str,
    next: &str,
    status: Option<&str>,
    kind: &str,
    seq: i64,
) -> Row {
    Row::new(vec![
        Value::from(name),
        Value::from(first),
        Value::from(next),
        status.map(Value::from).unwrap_or(Value::Null),
        Value::from(kind),
        Value::Int64(seq),
    ])
}

fn content_row(scn: u64, op: i64, sql: &str, csf: i64) -> Row {
    Row::new(vec![
        Value::from(scn.to_string()),
        Value::Int64(op),
        Value::from("0A000B0C"),
        Value::from("APP"),
        Value::from("ORDERS"),
        Value::from(sql),
        Value::Int64(csf),
    ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = MinerConfig::builder()
        .url("//db1.example.com:1521/orcl")
        .username("miner")
        .password("secret")
        .build()?;

    // What an operator would see before picking explicit window bounds
    let inventory = redomine::scn_inventory(&CannedConnection).await?;
    println!("available change numbers: {inventory:?}");

    let window = MiningWindow::new(Scn::new(13_196_034), Scn::new(14_777_862));
    println!("Mining window: {window}");

    let mut session = MiningSession::new(CannedConnection, config);
    session.build_dictionary().await?;
    session.register_segments(window).await?;
    session.start_mining(window).await?;

    for record in session.mine_records(window).await? {
        println!("record: {}", serde_json::to_string(&record)?);
    }

    session.end_mining().await?;
    println!("metrics: {}", serde_json::to_string(&session.metrics())?);
    Ok(())
}
