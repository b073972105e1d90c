//! Change record reassembly.
//!
//! The mining query delivers one row per statement fragment: large
//! reconstructed statements are split across consecutive rows, each carrying
//! a continuation flag. [`RecordReassembler`] folds a forward-only cursor of
//! such rows back into logically complete [`ChangeRecord`]s.

use crate::connection::Row;
use crate::error::{MinerError, Result};
use crate::scn::Scn;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Operation that produced a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedoOperation {
    /// Row inserted
    Insert,
    /// Row deleted
    Delete,
    /// Row updated
    Update,
    /// Schema change
    Ddl,
    /// Transaction start
    Start,
    /// Transaction commit
    Commit,
    /// Transaction rollback
    Rollback,
    /// Operation the driver does not decode
    Unsupported,
}

impl RedoOperation {
    /// Decode the engine's numeric operation code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Insert,
            2 => Self::Delete,
            3 => Self::Update,
            5 => Self::Ddl,
            6 => Self::Start,
            7 => Self::Commit,
            36 => Self::Rollback,
            _ => Self::Unsupported,
        }
    }
}

/// A logically complete change record.
///
/// Immutable once emitted. `truncated` marks records whose statement text hit
/// the continuation limit; the text is complete up to that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Change number of the record.
    pub scn: Scn,
    /// Operation that produced it.
    pub operation: RedoOperation,
    /// Identifier of the owning transaction.
    pub transaction_id: String,
    /// Owner of the affected object, when the record has one.
    pub schema_owner: Option<String>,
    /// Affected table, when the record has one.
    pub table_name: Option<String>,
    /// Fully concatenated statement text.
    pub sql_text: String,
    /// The statement text exceeded the continuation limit and was cut short.
    pub truncated: bool,
}

/// Folds mining query rows into [`ChangeRecord`]s.
///
/// Each record may span up to `1 + max_continuation_rows` rows. A record that
/// would span more is emitted truncated (with a warning) and the excess
/// fragments are discarded to keep the cursor aligned on record boundaries;
/// truncation is recoverable and observable, never fatal. A cursor that ends
/// while a continuation flag is still set is a malformed stream and aborts
/// the pass.
pub struct RecordReassembler<I> {
    rows: I,
    max_continuation_rows: u32,
}

impl<I> RecordReassembler<I>
where
    I: Iterator<Item = Row>,
{
    /// Wrap a forward-only row cursor.
    pub fn new(rows: I, max_continuation_rows: u32) -> Self {
        Self {
            rows,
            max_continuation_rows,
        }
    }

    /// Reassemble the next record, or `None` when the cursor is exhausted on
    /// a record boundary.
    pub fn next_record(&mut self) -> Result<Option<ChangeRecord>> {
        let Some(row) = self.rows.next() else {
            return Ok(None);
        };

        let header = parse_header(&row)?;
        let mut sql_text = header.fragment;
        let mut continued = header.continued;
        let mut remaining = self.max_continuation_rows;
        let mut truncated = false;

        while continued {
            let next = self
                .rows
                .next()
                .ok_or(MinerError::MalformedStream { scn: header.scn })?;
            let (fragment, next_continued) = parse_continuation(&next)?;
            if truncated || remaining == 0 {
                if !truncated {
                    truncated = true;
                    warn!(
                        scn = %header.scn,
                        limit = self.max_continuation_rows,
                        "statement text exceeds the continuation limit, truncating record"
                    );
                }
                // Discard the excess fragment; the cursor must still walk to
                // the end of this record group.
            } else {
                sql_text.push_str(&fragment);
                remaining -= 1;
            }
            continued = next_continued;
        }

        Ok(Some(ChangeRecord {
            scn: header.scn,
            operation: header.operation,
            transaction_id: header.transaction_id,
            schema_owner: header.schema_owner,
            table_name: header.table_name,
            sql_text,
            truncated,
        }))
    }
}

impl<I> Iterator for RecordReassembler<I>
where
    I: Iterator<Item = Row>,
{
    type Item = Result<ChangeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

struct RecordHeader {
    scn: Scn,
    operation: RedoOperation,
    transaction_id: String,
    schema_owner: Option<String>,
    table_name: Option<String>,
    fragment: String,
    continued: bool,
}

/// Decode the first row of a record group:
/// `SCN, OPERATION_CODE, XID, SEG_OWNER, TABLE_NAME, SQL_REDO, CSF`.
fn parse_header(row: &Row) -> Result<RecordHeader> {
    let scn = row
        .u64(0)
        .map(Scn::new)
        .ok_or_else(|| MinerError::UnexpectedRow("record row without an SCN".to_string()))?;
    let operation = row
        .i64(1)
        .map(RedoOperation::from_code)
        .ok_or_else(|| {
            MinerError::UnexpectedRow(format!("record at SCN {scn} has no operation code"))
        })?;
    let transaction_id = row
        .str(2)
        .ok_or_else(|| {
            MinerError::UnexpectedRow(format!("record at SCN {scn} has no transaction id"))
        })?
        .to_string();
    let schema_owner = row.str(3).map(str::to_string);
    let table_name = row.str(4).map(str::to_string);
    let fragment = row.str(5).unwrap_or_default().to_string();
    let continued = continuation_flag(row, scn)?;

    Ok(RecordHeader {
        scn,
        operation,
        transaction_id,
        schema_owner,
        table_name,
        fragment,
        continued,
    })
}

/// Decode a continuation row: only its fragment and flag matter.
fn parse_continuation(row: &Row) -> Result<(String, bool)> {
    let scn = row.u64(0).map(Scn::new).unwrap_or(Scn::ZERO);
    let fragment = row.str(5).unwrap_or_default().to_string();
    let continued = continuation_flag(row, scn)?;
    Ok((fragment, continued))
}

fn continuation_flag(row: &Row, scn: Scn) -> Result<bool> {
    row.u64(6)
        .map(|flag| flag != 0)
        .ok_or_else(|| {
            MinerError::UnexpectedRow(format!("record at SCN {scn} has no continuation flag"))
        })
}
