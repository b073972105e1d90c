//! Error taxonomy for the mining driver.
//!
//! Selection and registration failures abort the current session attempt and
//! require a restart from `Idle`; reassembly truncation is recovered locally
//! (it is a warning, not an error); everything else propagates unchanged.
//! No retry is built in; retry policy belongs to the caller.

use crate::connection::ExecutionError;
use crate::scn::Scn;
use crate::session::SessionState;
use thiserror::Error;

/// Result type for mining driver operations.
pub type Result<T> = std::result::Result<T, MinerError>;

/// Errors surfaced by the mining driver.
#[derive(Error, Debug)]
pub enum MinerError {
    /// No selected segment's lower bound covers the requested offset. The
    /// caller must re-baseline (e.g. re-snapshot) rather than retry.
    #[error("no log segment contains offset SCN {offset}; re-snapshot is required")]
    Coverage {
        /// The uncovered offset change number.
        offset: Scn,
    },

    /// Archive-only mining was requested but the offset predates every
    /// retained archive segment. An operational fix (extend retention, force
    /// a log switch) is needed, not a data re-sync.
    #[error(
        "offset SCN {offset} is not in any retained archive segment; \
         extend archive retention or force a log switch and restart"
    )]
    RetentionExhausted {
        /// The aged-out offset change number.
        offset: Scn,
    },

    /// A selected segment could not be registered (vanished, permission,
    /// duplicate). Fatal for this attempt; the whole selection+registration
    /// cycle may be retried from `Idle`.
    #[error("failed to register log segment '{segment}': {source}")]
    Registration {
        /// Name of the segment that failed to register.
        segment: String,
        #[source]
        source: ExecutionError,
    },

    /// A lifecycle operation was invoked out of order. Programming contract
    /// violation: the call fails fast and leaves the state unchanged.
    #[error("{operation} is not allowed in state {actual}, expected {expected}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the operation requires.
        expected: SessionState,
        /// State the session was actually in.
        actual: SessionState,
    },

    /// A continuation flag promised more fragments than the cursor delivered.
    /// The record stream is malformed or stopped early; fatal for the current
    /// consumption pass.
    #[error("record stream ended while the record at SCN {scn} was marked as continued")]
    MalformedStream {
        /// Change number of the record left incomplete.
        scn: Scn,
    },

    /// A result row did not have the shape the driver's query asked for.
    #[error("unexpected result row: {0}")]
    UnexpectedRow(String),

    /// Invalid driver configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A connection operation failed.
    #[error(transparent)]
    Database(#[from] ExecutionError),
}

impl MinerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the same attempt may be retried after a full restart from
    /// `Idle` (as opposed to needing a re-baseline or an operator fix).
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Registration { .. } => true,
            Self::Database(e) => e.is_retriable(),
            Self::Coverage { .. }
            | Self::RetentionExhausted { .. }
            | Self::InvalidState { .. }
            | Self::MalformedStream { .. }
            | Self::UnexpectedRow(_)
            | Self::Config(_) => false,
        }
    }
}
