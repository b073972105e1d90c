//! Mining session lifecycle.
//!
//! [`MiningSession`] owns one connection for one full `Idle` → `Ended`
//! lifecycle and drives the ordered steps of a mining session: dictionary
//! preparation, segment registration, session start, record consumption,
//! session end. Every step checks the state first and fails fast on
//! out-of-order calls; after a fatal error the only recovery is a fresh
//! connection and a new session from `Idle`.

use crate::config::MinerConfig;
use crate::connection::Connection;
use crate::error::{MinerError, Result};
use crate::metrics::{Phase, SessionMetrics, SessionMetricsSnapshot};
use crate::reassembly::{ChangeRecord, RecordReassembler};
use crate::scn::MiningWindow;
use crate::selector;
use crate::sql;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Lifecycle state of a mining session. Transitions are linear; there are no
/// cycles except restarting from `Idle` with a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing prepared yet.
    Idle,
    /// Schema dictionary snapshot written.
    DictionaryReady,
    /// Segment set registered with the engine.
    SegmentsRegistered,
    /// Session started; records can be consumed.
    Mining,
    /// Session stopped.
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::DictionaryReady => "DictionaryReady",
            Self::SegmentsRegistered => "SegmentsRegistered",
            Self::Mining => "Mining",
            Self::Ended => "Ended",
        };
        f.write_str(name)
    }
}

/// Drives one mining session lifecycle over an exclusively held connection.
pub struct MiningSession<C> {
    conn: C,
    config: MinerConfig,
    state: SessionState,
    metrics: SessionMetrics,
}

impl<C: Connection> MiningSession<C> {
    /// Create an idle session over `conn`.
    pub fn new(conn: C, config: MinerConfig) -> Self {
        Self {
            conn,
            config,
            state: SessionState::Idle,
            metrics: SessionMetrics::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The configuration this session runs with.
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Snapshot of the session counters and phase timings.
    pub fn metrics(&self) -> SessionMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Give the connection back once the lifecycle is over.
    pub fn into_connection(self) -> C {
        self.conn
    }

    fn expect_state(&self, operation: &'static str, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(MinerError::InvalidState {
                operation,
                expected,
                actual: self.state,
            })
        }
    }

    /// Snapshot schema metadata so later record reassembly can resolve
    /// object names. Must run before segment registration; once per session.
    pub async fn build_dictionary(&mut self) -> Result<()> {
        self.expect_state("build_dictionary", SessionState::Idle)?;

        info!(dictionary = ?self.config.dictionary_target, "building schema dictionary");
        let started = Instant::now();
        self.conn
            .execute(&sql::build_dictionary_statement(&self.config.dictionary_target))
            .await?;
        let elapsed = started.elapsed();
        self.metrics.record_phase(Phase::DictionaryBuild, elapsed);
        info!(?elapsed, "schema dictionary built");

        self.state = SessionState::DictionaryReady;
        Ok(())
    }

    /// Select and register the segment set covering `window`.
    ///
    /// Any segments left registered by a prior run are cleared first; the
    /// reset is idempotent and per-segment removal failures are ignored (the
    /// file may already be gone). A failure to register a selected segment is
    /// fatal for this attempt; restart from `Idle`.
    ///
    /// Returns the number of segments registered.
    pub async fn register_segments(&mut self, window: MiningWindow) -> Result<usize> {
        self.expect_state("register_segments", SessionState::DictionaryReady)?;

        let started = Instant::now();
        self.reset_registered().await?;

        let segments = selector::select_segments(&self.conn, window, &self.config).await?;
        self.metrics.record_selection(segments.len());

        let names: Vec<String> = segments.iter().map(|s| s.name().to_string()).collect();
        let bytes = self.total_segment_bytes(&names).await;
        if let Some(bytes) = bytes {
            info!(
                segments = names.len(),
                total_mb = bytes / (1024 * 1024),
                "segment volume to mine"
            );
        }

        for segment in &segments {
            debug!(name = segment.name(), "registering segment");
            self.conn
                .execute(&sql::add_segment_statement(segment.name()))
                .await
                .map_err(|source| MinerError::Registration {
                    segment: segment.name().to_string(),
                    source,
                })?;
        }

        let elapsed = started.elapsed();
        self.metrics.record_registration(segments.len(), bytes);
        self.metrics.record_phase(Phase::Registration, elapsed);
        info!(
            offset = %window.offset_scn,
            segments = ?names,
            ?elapsed,
            "segments registered for mining"
        );

        self.state = SessionState::SegmentsRegistered;
        Ok(segments.len())
    }

    /// Start the mining session bound to `window`.
    pub async fn start_mining(&mut self, window: MiningWindow) -> Result<()> {
        self.expect_state("start_mining", SessionState::SegmentsRegistered)?;

        info!(
            %window,
            strategy = ?self.config.strategy,
            continuous = self.config.continuous_mining,
            "starting mining session"
        );
        let started = Instant::now();
        self.conn
            .execute(&sql::start_mining_statement(
                window,
                self.config.strategy,
                self.config.continuous_mining,
            ))
            .await?;
        let elapsed = started.elapsed();
        self.metrics.record_phase(Phase::SessionStart, elapsed);
        info!(?elapsed, "mining session started");

        self.state = SessionState::Mining;
        Ok(())
    }

    /// Consume the change records of `window` through the reassembler.
    ///
    /// Legal only while mining; does not transition. Records whose statement
    /// text exceeded the continuation limit come back truncated (and
    /// counted), which is a warning, not a failure.
    pub async fn mine_records(&mut self, window: MiningWindow) -> Result<Vec<ChangeRecord>> {
        self.expect_state("mine_records", SessionState::Mining)?;

        let started = Instant::now();
        let rows = self.conn.query(&sql::mining_contents_query(window)).await?;
        let reassembler =
            RecordReassembler::new(rows.into_iter(), self.config.max_continuation_rows);
        let records: Vec<ChangeRecord> = reassembler.collect::<Result<_>>()?;

        let truncated = records.iter().filter(|r| r.truncated).count();
        let elapsed = started.elapsed();
        self.metrics.record_mined(records.len(), truncated);
        self.metrics.record_phase(Phase::Mining, elapsed);
        info!(records = records.len(), truncated, ?elapsed, "mining pass complete");

        Ok(records)
    }

    /// Stop the mining session.
    ///
    /// Idempotent: calling it again after the session ended succeeds, and the
    /// engine reporting "no active session" is treated as success: the
    /// session may have been closed by an external actor. Any other failure
    /// is fatal; a full reconnect and restart is required before this
    /// component can be used again.
    pub async fn end_mining(&mut self) -> Result<()> {
        match self.state {
            SessionState::Ended => {
                debug!("mining session already ended");
                return Ok(());
            }
            SessionState::Mining => {}
            actual => {
                return Err(MinerError::InvalidState {
                    operation: "end_mining",
                    expected: SessionState::Mining,
                    actual,
                })
            }
        }

        info!("ending mining session");
        let started = Instant::now();
        match self.conn.execute(sql::end_mining_statement()).await {
            Ok(()) => {}
            Err(e) if e.has_vendor_code("ORA-01307") => {
                info!("mining session was already closed");
            }
            Err(e) => {
                error!(error = %e, "failed to end mining session; reconnect required");
                return Err(e.into());
            }
        }
        let elapsed = started.elapsed();
        self.metrics.record_phase(Phase::SessionEnd, elapsed);
        info!(?elapsed, "mining session ended");

        self.state = SessionState::Ended;
        Ok(())
    }

    /// Remove every segment the engine still has registered.
    async fn reset_registered(&self) -> Result<()> {
        let rows = self.conn.query(&sql::registered_segments_query()).await?;
        for row in &rows {
            let Some(name) = row.str(0) else { continue };
            match self
                .conn
                .execute(&sql::remove_segment_statement(name))
                .await
            {
                Ok(()) => debug!(name, "segment removed from mining"),
                Err(e) => warn!(name, error = %e, "could not remove stale segment"),
            }
        }
        Ok(())
    }

    async fn total_segment_bytes(&self, names: &[String]) -> Option<u64> {
        if names.is_empty() {
            return None;
        }
        match self.conn.query(&sql::segment_bytes_query(names)).await {
            Ok(rows) => rows.first().and_then(|row| row.u64(0)),
            Err(e) => {
                error!(error = %e, "failed to query segment sizes");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ExecutionError, Row};
    use async_trait::async_trait;

    /// Accepts every statement, answers every query with no rows.
    struct NullConnection;

    #[async_trait]
    impl Connection for NullConnection {
        async fn execute(&self, _statement: &str) -> std::result::Result<(), ExecutionError> {
            Ok(())
        }

        async fn query(&self, _sql: &str) -> std::result::Result<Vec<Row>, ExecutionError> {
            Ok(Vec::new())
        }
    }

    fn config() -> MinerConfig {
        MinerConfig::builder()
            .url("//db1:1521/orcl")
            .username("miner")
            .build()
            .unwrap()
    }

    fn window() -> MiningWindow {
        MiningWindow::from_offset(crate::scn::Scn::new(100), 400)
    }

    #[tokio::test]
    async fn test_out_of_order_calls_fail_fast() {
        let mut session = MiningSession::new(NullConnection, config());

        // Skipping registration after the dictionary step
        session.build_dictionary().await.unwrap();
        let err = session.start_mining(window()).await.unwrap_err();
        assert!(matches!(
            err,
            MinerError::InvalidState {
                operation: "start_mining",
                expected: SessionState::SegmentsRegistered,
                actual: SessionState::DictionaryReady,
            }
        ));
        // State is unchanged by the rejected call
        assert_eq!(session.state(), SessionState::DictionaryReady);
    }

    #[tokio::test]
    async fn test_dictionary_build_is_once_per_session() {
        let mut session = MiningSession::new(NullConnection, config());
        session.build_dictionary().await.unwrap();
        let err = session.build_dictionary().await.unwrap_err();
        assert!(matches!(err, MinerError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_mining_requires_started_session() {
        let mut session = MiningSession::new(NullConnection, config());
        let err = session.mine_records(window()).await.unwrap_err();
        assert!(matches!(
            err,
            MinerError::InvalidState {
                operation: "mine_records",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_selection_failure_leaves_dictionary_state() {
        // No candidate segments at all: selection cannot cover the offset
        let mut session = MiningSession::new(NullConnection, config());
        session.build_dictionary().await.unwrap();
        let err = session.register_segments(window()).await.unwrap_err();
        assert!(matches!(err, MinerError::Coverage { .. }));
        assert_eq!(session.state(), SessionState::DictionaryReady);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "Idle");
        assert_eq!(SessionState::SegmentsRegistered.to_string(), "SegmentsRegistered");
    }
}
