//! Session metrics.
//!
//! Counters and phase timings exposed to the caller. Diagnostic log lines
//! report the same numbers; the snapshot is the functional surface.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe metrics for one mining session lifecycle.
///
/// Use [`SessionMetrics::snapshot`] to read a consistent view.
#[derive(Default)]
pub struct SessionMetrics {
    segments_selected: AtomicU64,
    segments_registered: AtomicU64,
    segment_bytes: AtomicU64,
    records_mined: AtomicU64,
    records_truncated: AtomicU64,
    dictionary_build_ms: AtomicU64,
    registration_ms: AtomicU64,
    session_start_ms: AtomicU64,
    mining_ms: AtomicU64,
    session_end_ms: AtomicU64,
}

impl SessionMetrics {
    pub(crate) fn record_selection(&self, selected: usize) {
        self.segments_selected
            .store(selected as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_registration(&self, registered: usize, bytes: Option<u64>) {
        self.segments_registered
            .store(registered as u64, Ordering::Relaxed);
        if let Some(bytes) = bytes {
            self.segment_bytes.store(bytes, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_mined(&self, records: usize, truncated: usize) {
        self.records_mined
            .fetch_add(records as u64, Ordering::Relaxed);
        self.records_truncated
            .fetch_add(truncated as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_phase(&self, phase: Phase, elapsed: Duration) {
        let ms = elapsed.as_millis() as u64;
        let slot = match phase {
            Phase::DictionaryBuild => &self.dictionary_build_ms,
            Phase::Registration => &self.registration_ms,
            Phase::SessionStart => &self.session_start_ms,
            Phase::Mining => &self.mining_ms,
            Phase::SessionEnd => &self.session_end_ms,
        };
        slot.store(ms, Ordering::Relaxed);
    }

    /// Export a snapshot of the current values.
    pub fn snapshot(&self) -> SessionMetricsSnapshot {
        SessionMetricsSnapshot {
            segments_selected: self.segments_selected.load(Ordering::Relaxed),
            segments_registered: self.segments_registered.load(Ordering::Relaxed),
            segment_bytes: self.segment_bytes.load(Ordering::Relaxed),
            records_mined: self.records_mined.load(Ordering::Relaxed),
            records_truncated: self.records_truncated.load(Ordering::Relaxed),
            dictionary_build_ms: self.dictionary_build_ms.load(Ordering::Relaxed),
            registration_ms: self.registration_ms.load(Ordering::Relaxed),
            session_start_ms: self.session_start_ms.load(Ordering::Relaxed),
            mining_ms: self.mining_ms.load(Ordering::Relaxed),
            session_end_ms: self.session_end_ms.load(Ordering::Relaxed),
        }
    }
}

/// Lifecycle phase being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    DictionaryBuild,
    Registration,
    SessionStart,
    Mining,
    SessionEnd,
}

/// Point-in-time metrics export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionMetricsSnapshot {
    /// Segments returned by the last selection.
    pub segments_selected: u64,
    /// Segments registered with the engine.
    pub segments_registered: u64,
    /// Total bytes of the registered segments, when the server reported them.
    pub segment_bytes: u64,
    /// Change records emitted across all mining passes.
    pub records_mined: u64,
    /// Records cut short by the continuation limit.
    pub records_truncated: u64,
    /// Dictionary build duration, milliseconds.
    pub dictionary_build_ms: u64,
    /// Selection + registration duration, milliseconds.
    pub registration_ms: u64,
    /// Session start duration, milliseconds.
    pub session_start_ms: u64,
    /// Cumulative duration of the last mining pass, milliseconds.
    pub mining_ms: u64,
    /// Session end duration, milliseconds.
    pub session_end_ms: u64,
}
