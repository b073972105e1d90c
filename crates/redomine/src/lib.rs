//! # redomine - redo log mining driver
//!
//! Change capture against an Oracle-style transaction log stream: selects
//! the archived and online log segments that cover a requested change-number
//! window, registers them with the server-side mining engine, drives the
//! session lifecycle, and reassembles change records whose statement text is
//! split across multiple result rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   select    ┌──────────────────┐
//! │ Segment     │◀────────────│ MiningSession    │
//! │ Selector    │             │ (state machine)  │
//! └──────┬──────┘             └────────┬─────────┘
//!        │ ordered segments            │ register / start / end
//!        ▼                             ▼
//! ┌──────────────────────────────────────────────┐
//! │              Connection trait                │
//! │   execute(statement)     query(sql) → rows   │
//! └──────────────────────┬───────────────────────┘
//!                        │ mining query rows
//!                        ▼
//!              ┌───────────────────┐
//!              │ RecordReassembler │──▶ ChangeRecord
//!              └───────────────────┘
//! ```
//!
//! The lifecycle is linear and enforced:
//!
//! ```text
//! Idle → DictionaryReady → SegmentsRegistered → Mining → Ended
//! ```
//!
//! Everything runs sequentially over a single exclusively held connection;
//! the driver spawns no tasks and enforces no timeouts. After a fatal error
//! the recovery path is a fresh connection and a new session from `Idle`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redomine::{Connection, MinerConfig, MiningSession, MiningWindow, Scn};
//!
//! async fn example(conn: impl Connection) -> redomine::Result<()> {
//!     let config = MinerConfig::builder()
//!         .url("//db1.example.com:1521/orcl")
//!         .username("miner")
//!         .password("secret")
//!         .build()?;
//!
//!     let window = MiningWindow::new(Scn::new(13_196_034), Scn::new(14_777_862));
//!
//!     let mut session = MiningSession::new(conn, config);
//!     session.build_dictionary().await?;
//!     session.register_segments(window).await?;
//!     session.start_mining(window).await?;
//!     for record in session.mine_records(window).await? {
//!         println!("{} {:?} {}", record.scn, record.operation, record.sql_text);
//!     }
//!     session.end_mining().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod reassembly;
pub mod scn;
pub mod segment;
pub mod selector;
pub mod session;
mod sql;

// Core types: the session lifecycle and what flows through it.
pub use config::{DictionaryTarget, MinerConfig, MinerConfigBuilder, MiningStrategy};
pub use connection::{Connection, ExecutionError, Row, Value};
pub use error::{MinerError, Result};
pub use reassembly::{ChangeRecord, RecordReassembler, RedoOperation};
pub use scn::{MiningWindow, Scn, ScnBound};
pub use segment::{LogSegment, SegmentKind};
pub use session::{MiningSession, SessionState};

// Selection and observability surfaces.
pub use metrics::SessionMetricsSnapshot;
pub use selector::{current_scn, scn_inventory, select_segments, ScnInventory};
