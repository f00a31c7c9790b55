//! Errors for the entry log.

use crate::entry::EntryIdx;
use crate::store::StoreError;

/// Log result type
pub type LogResult<T> = Result<T, LogError>;

/// Entry log errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Structurally invalid entry (wrong length, wrong type for the decoder)
    #[error("Malformed entry: {reason}")]
    MalformedEntry {
        /// What was wrong with it
        reason: String,
    },

    /// Entry type tag this version does not understand
    #[error("Unsupported entry type: {tag}")]
    UnsupportedEntryType {
        /// The raw tag byte
        tag: u8,
    },

    /// Entry that is not allowed at this point of the sequence
    #[error("Unexpected entry: {reason}")]
    UnexpectedEntry {
        /// Which sequencing rule was broken
        reason: String,
    },

    /// A new log started before the previous one completed
    #[error("Cannot process log before last log completes")]
    LogInProgress,

    /// A log arrived before its block seal was confirmed
    #[error("Block not sealed: {reason}")]
    BlockNotSealed {
        /// Context
        reason: String,
    },

    /// Log or block applied out of order
    #[error("Out of order: {reason}")]
    OutOfOrder {
        /// Which ordering rule was broken
        reason: String,
    },

    /// Block does not build on the current chain
    #[error("Conflict: {reason}")]
    Conflict {
        /// Which linkage check failed
        reason: String,
    },

    /// Executing message that cannot be written
    #[error("Invalid executing message: {reason}")]
    InvalidExecutingMessage {
        /// Why it cannot be written
        reason: String,
    },

    /// Bootstrap over a cursor that already has entries
    #[error("Can only bootstrap on top of an empty state, next index is {next_index}")]
    NotEmpty {
        /// Index the cursor is at
        next_index: EntryIdx,
    },

    /// Storage collaborator failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An entry failed to apply; carries the entry for diagnostics
    #[error("Failed to process type {entry_type} entry at idx {index} ({raw}): {source}")]
    Entry {
        /// Type name of the entry
        entry_type: String,
        /// Index the entry would have occupied
        index: EntryIdx,
        /// Hex of the raw entry bytes
        raw: String,
        /// Underlying failure
        #[source]
        source: Box<LogError>,
    },
}

impl LogError {
    /// The underlying error, looking through entry context
    #[must_use]
    pub fn root(&self) -> &LogError {
        match self {
            Self::Entry { source, .. } => source.root(),
            other => other,
        }
    }

    /// Block linkage mismatch, i.e. a fork or reorg
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), Self::Conflict { .. })
    }

    /// Ordering violation in the supplied input
    #[must_use]
    pub fn is_out_of_order(&self) -> bool {
        matches!(self.root(), Self::OutOfOrder { .. })
    }
}
