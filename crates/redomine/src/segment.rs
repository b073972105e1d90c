//! Log segment data model.
//!
//! A segment is a contiguous unit of the log stream: archived (closed,
//! immutable) or online (an active write target, one of which is current).
//! Instances are built fresh from selection query rows and discarded once
//! registration consumes them.

use crate::scn::{Scn, ScnBound};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Whether a segment lives in the archive or the online redo group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Closed, immutable archive copy.
    Archived,
    /// Online redo entry, possibly still being written.
    Online,
}

/// One log segment's change-number span and ordering key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSegment {
    name: String,
    first_scn: Scn,
    next_scn: ScnBound,
    sequence: u64,
    kind: SegmentKind,
    current: bool,
}

impl LogSegment {
    /// Create a segment describing an archived log record.
    pub fn archived(name: impl Into<String>, first_scn: Scn, next_scn: ScnBound, sequence: u64) -> Self {
        Self {
            name: name.into(),
            first_scn,
            next_scn,
            sequence,
            kind: SegmentKind::Archived,
            current: false,
        }
    }

    /// Create a segment describing an online redo log record.
    pub fn online(
        name: impl Into<String>,
        first_scn: Scn,
        next_scn: ScnBound,
        sequence: u64,
        current: bool,
    ) -> Self {
        Self {
            name: name.into(),
            first_scn,
            next_scn,
            sequence,
            kind: SegmentKind::Online,
            current,
        }
    }

    /// Segment identifier (file name on the server).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First change number contained in this segment.
    pub fn first_scn(&self) -> Scn {
        self.first_scn
    }

    /// Recorded exclusive upper bound, as reported by the server.
    pub fn recorded_next_scn(&self) -> ScnBound {
        self.next_scn
    }

    /// Effective exclusive upper bound. A current segment is still being
    /// written, so its bound is unbounded regardless of the recorded value.
    pub fn next_scn(&self) -> ScnBound {
        if self.current {
            ScnBound::Unbounded
        } else {
            self.next_scn
        }
    }

    /// Unique sequence number within the segment lineage.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Archive or online.
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Whether this is the current online write target.
    pub fn is_current(&self) -> bool {
        self.current
    }
}

// Identity is the sequence number alone; name and change-number fields are
// not part of it. This is the sole basis for deduplication.
impl PartialEq for LogSegment {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for LogSegment {}

impl Hash for LogSegment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
    }
}
