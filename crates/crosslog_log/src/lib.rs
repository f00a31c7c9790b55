//! CROSSLOG Entry Log
//!
//! Append-only log of blocks, log events and executing messages, stored as
//! fixed 24-byte entries. A [`LogContext`] cursor validates stored entries
//! as they are replayed and synthesizes the entries implied by new blocks
//! and logs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod infer;
pub mod need;
pub mod record;
pub mod replay;
pub mod state;
pub mod store;
pub mod write;

pub use entry::{
    DecodeEntry, ENTRY_SIZE, EncodeEntry, Entry, EntryIdx, EntryType, SEARCH_CHECKPOINT_FREQUENCY,
};
pub use error::{LogError, LogResult};
pub use infer::{INFER_SANITY_LIMIT, Inferred};
pub use need::{Need, NeedSet};
pub use record::{
    CanonicalHash, ExecutingCheck, ExecutingLink, InitiatingEvent, Padding, Record,
    SearchCheckpoint,
};
pub use state::{InitMessage, LogContext, PendingExec, SealedBlock};
pub use store::{EntryStore, MemEntryStore, StoreError, StoreResult};
