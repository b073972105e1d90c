//! Change number (SCN) primitives.
//!
//! An SCN is a monotonically increasing counter identifying a point in the
//! transaction log stream. Segment upper bounds are carried as [`ScnBound`]
//! rather than a numeric sentinel: the active segment and segments with a
//! NULL or unparseable recorded bound are `Unbounded`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A system change number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Scn(u64);

impl Scn {
    /// The lowest representable change number.
    pub const ZERO: Scn = Scn(0);

    /// Create an SCN from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value of this SCN.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Offset this SCN forward, saturating at the maximum representable value.
    pub const fn saturating_add(self, delta: u64) -> Scn {
        Scn(self.0.saturating_add(delta))
    }
}

impl From<u64> for Scn {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Scn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Upper bound of a log segment's change-number span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScnBound {
    /// Closed segment: the first change number of the following segment.
    Bounded(Scn),
    /// No effective bound: the segment is still being written, or the
    /// recorded bound was NULL/unparseable.
    Unbounded,
}

impl ScnBound {
    /// Interpret a raw column value. NULL and unparseable text map to
    /// `Unbounded` rather than being rejected.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(|s| s.trim().parse::<u64>().ok()) {
            Some(value) => ScnBound::Bounded(Scn(value)),
            None => ScnBound::Unbounded,
        }
    }

    /// Whether this bound reaches at least `scn`.
    pub fn covers(self, scn: Scn) -> bool {
        match self {
            ScnBound::Bounded(bound) => bound >= scn,
            ScnBound::Unbounded => true,
        }
    }
}

impl PartialOrd for ScnBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScnBound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ScnBound::Unbounded, ScnBound::Unbounded) => Ordering::Equal,
            (ScnBound::Unbounded, ScnBound::Bounded(_)) => Ordering::Greater,
            (ScnBound::Bounded(_), ScnBound::Unbounded) => Ordering::Less,
            (ScnBound::Bounded(a), ScnBound::Bounded(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for ScnBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScnBound::Bounded(scn) => scn.fmt(f),
            ScnBound::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// The change-number range one mining pass must cover.
///
/// `offset_scn` is exclusive (already processed); `end_scn` is inclusive of
/// the last change to mine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningWindow {
    /// Last change number already processed.
    pub offset_scn: Scn,
    /// Last change number to mine.
    pub end_scn: Scn,
}

impl MiningWindow {
    /// Create a window from explicit bounds.
    pub const fn new(offset_scn: Scn, end_scn: Scn) -> Self {
        Self { offset_scn, end_scn }
    }

    /// Convenience wrapper for callers that only track an offset: the end
    /// bound is `offset + batch`, saturating.
    pub const fn from_offset(offset_scn: Scn, batch: u64) -> Self {
        Self {
            offset_scn,
            end_scn: offset_scn.saturating_add(batch),
        }
    }
}

impl fmt::Display for MiningWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.offset_scn, self.end_scn)
    }
}
