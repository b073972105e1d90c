//! Log segment selection.
//!
//! Given a mining window, builds the ordered list of archived and online
//! segments that must be registered to cover it. Selection always re-queries
//! the server; nothing is cached between calls.

use crate::config::MinerConfig;
use crate::connection::{Connection, Row};
use crate::error::{MinerError, Result};
use crate::scn::{MiningWindow, Scn, ScnBound};
use crate::segment::{LogSegment, SegmentKind};
use crate::sql;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

/// Select the segments that must be mined to cover `window`.
///
/// The returned list is ordered archived-first, then online, each group in
/// ascending sequence order. When an online segment and an archived segment
/// share a sequence number, the online one wins: registering both would be
/// rejected by the engine as a duplicate file.
///
/// Fails with [`MinerError::Coverage`] when no selected segment's lower bound
/// reaches the window offset, or [`MinerError::RetentionExhausted`] when
/// archive-only mode is active and nothing at all was retained.
pub async fn select_segments<C>(
    conn: &C,
    window: MiningWindow,
    config: &MinerConfig,
) -> Result<Vec<LogSegment>>
where
    C: Connection + ?Sized,
{
    let offset = window.offset_scn;
    debug!(%window, archive_only = config.archive_only, "selecting segments to mine");

    let query = sql::minable_segments_query(
        window,
        config.retention,
        config.archive_only,
        config.destination.as_deref(),
    );
    let rows = conn.query(&query).await?;

    // Single pass keyed by sequence. Archived entries never displace an
    // online entry with the same sequence; online entries always do.
    let mut by_sequence: BTreeMap<u64, LogSegment> = BTreeMap::new();
    let mut candidates = 0usize;

    for row in &rows {
        candidates += 1;
        let segment = parse_segment_row(row)?;
        match segment.kind() {
            SegmentKind::Archived => {
                if segment.next_scn().covers(offset) {
                    trace!(
                        name = segment.name(),
                        sequence = segment.sequence(),
                        "archived segment kept"
                    );
                    by_sequence.entry(segment.sequence()).or_insert(segment);
                } else {
                    trace!(name = segment.name(), "archived segment excluded");
                }
            }
            SegmentKind::Online => {
                if segment.is_current() || segment.next_scn().covers(offset) {
                    trace!(
                        name = segment.name(),
                        sequence = segment.sequence(),
                        current = segment.is_current(),
                        "online segment kept"
                    );
                    by_sequence.insert(segment.sequence(), segment);
                } else {
                    trace!(name = segment.name(), "online segment excluded");
                }
            }
        }
    }

    let (archived, online): (Vec<LogSegment>, Vec<LogSegment>) = by_sequence
        .into_values()
        .partition(|s| s.kind() == SegmentKind::Archived);

    info!(
        candidates,
        archived = archived.len(),
        online = online.len(),
        "segment selection complete"
    );

    let mut segments = archived;
    segments.extend(online);

    if !segments.iter().any(|s| s.first_scn() <= offset) {
        if segments.is_empty() && config.archive_only {
            return Err(MinerError::RetentionExhausted { offset });
        }
        return Err(MinerError::Coverage { offset });
    }

    Ok(segments)
}

/// Decode one row of the candidate query:
/// `NAME, FIRST_CHANGE#, NEXT_CHANGE#, STATUS, TYPE, SEQUENCE#`.
fn parse_segment_row(row: &Row) -> Result<LogSegment> {
    let name = row
        .str(0)
        .ok_or_else(|| MinerError::UnexpectedRow("segment row without a name".to_string()))?;
    let first_scn = row
        .u64(1)
        .map(Scn::new)
        .ok_or_else(|| {
            MinerError::UnexpectedRow(format!("segment '{name}' has no first change number"))
        })?;
    let next_scn = ScnBound::parse(row.str(2));
    let status = row.str(3);
    let kind = row
        .str(4)
        .ok_or_else(|| MinerError::UnexpectedRow(format!("segment '{name}' has no type")))?;
    let sequence = row.u64(5).ok_or_else(|| {
        MinerError::UnexpectedRow(format!("segment '{name}' has no sequence number"))
    })?;

    match kind {
        "ARCHIVED" => Ok(LogSegment::archived(name, first_scn, next_scn, sequence)),
        "ONLINE" => {
            let current = status.is_some_and(|s| s.eq_ignore_ascii_case("CURRENT"));
            Ok(LogSegment::online(name, first_scn, next_scn, sequence, current))
        }
        other => Err(MinerError::UnexpectedRow(format!(
            "segment '{name}' has unknown type '{other}'"
        ))),
    }
}

/// Oldest/newest change numbers the server can currently serve. Reported to
/// the operator when no explicit window bounds were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScnInventory {
    /// Oldest change number in any retained archive segment.
    pub min_scn: Option<Scn>,
    /// First change number of the most recently archived segment.
    pub last_archived_scn: Option<Scn>,
    /// Highest recorded upper bound across the online group.
    pub max_scn: Option<Scn>,
    /// The server's current change number.
    pub current_scn: Scn,
}

/// Query the mineable change-number range and the current position.
pub async fn scn_inventory<C>(conn: &C) -> Result<ScnInventory>
where
    C: Connection + ?Sized,
{
    let rows = conn.query(&sql::scn_inventory_query()).await?;
    let row = rows
        .first()
        .ok_or_else(|| MinerError::UnexpectedRow("empty change-number inventory".to_string()))?;

    Ok(ScnInventory {
        min_scn: row.u64(0).map(Scn::new),
        last_archived_scn: row.u64(1).map(Scn::new),
        max_scn: row.u64(2).map(Scn::new),
        current_scn: current_scn(conn).await?,
    })
}

/// The server's current change number.
pub async fn current_scn<C>(conn: &C) -> Result<Scn>
where
    C: Connection + ?Sized,
{
    let rows = conn.query(&sql::current_scn_query()).await?;
    rows.first()
        .and_then(|row| row.u64(0))
        .map(Scn::new)
        .ok_or_else(|| MinerError::UnexpectedRow("no current change number".to_string()))
}
