//! Cursor state of the entry log.
//!
//! A [`LogContext`] tracks where the log stands: the last sealed block, the
//! log currently being recorded, and the [`NeedSet`] of entries that must
//! still follow. It is advanced one entry at a time, either by replaying
//! stored entries or by synthesizing new ones into the output buffer.
//! The two directions never mix: the buffer must be flushed before any
//! stored entry is replayed.

use crate::entry::{Entry, EntryIdx};
use crate::need::{Need, NeedSet};
use crate::record::ExecutingLink;
use crosslog_core::{ExecutingMessage, TruncatedHash};
use serde::{Deserialize, Serialize};

/// Executing message attached to the log being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingExec {
    /// No executing message
    #[default]
    None,
    /// Supplied for writing; link and check entries still to be emitted
    Queued(ExecutingMessage),
    /// Link entry replayed, hash not known until the check entry
    Linked(ExecutingLink),
    /// Link and check both recorded
    Complete(ExecutingMessage),
}

impl PendingExec {
    /// Message waiting to be written, if any
    #[must_use]
    pub const fn queued(&self) -> Option<&ExecutingMessage> {
        match self {
            Self::Queued(msg) => Some(msg),
            _ => None,
        }
    }

    /// Fully recorded message, if any
    #[must_use]
    pub const fn complete(&self) -> Option<&ExecutingMessage> {
        match self {
            Self::Complete(msg) => Some(msg),
            _ => None,
        }
    }
}

/// The last sealed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBlock {
    /// Truncated block hash
    pub hash: TruncatedHash,
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
}

/// The last fully recorded log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitMessage {
    /// Truncated event hash
    pub hash: TruncatedHash,
    /// Index of the log within its block
    pub log_idx: u32,
}

/// Cursor over the entry log
///
/// Not internally synchronized; one writer owns it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogContext {
    /// Index of the next entry, counting the output buffer
    pub(crate) next_index: EntryIdx,

    /// Hash of the last sealed block. Only meaningful once
    /// [`Need::CanonicalHash`] is cleared.
    pub(crate) block_hash: TruncatedHash,
    pub(crate) block_num: u64,
    pub(crate) timestamp: u64,

    /// Logs fully recorded since the last seal
    pub(crate) logs_since: u32,

    /// Hash of the log being recorded, possibly still incomplete
    pub(crate) log_hash: TruncatedHash,
    pub(crate) exec: PendingExec,

    pub(crate) need: NeedSet,

    /// Entries not yet handed to storage
    pub(crate) out: Vec<Entry>,
}

impl LogContext {
    /// Create an empty cursor at index 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next entry will occupy, including buffered entries
    #[must_use]
    pub const fn next_index(&self) -> EntryIdx {
        self.next_index
    }

    /// Logs fully recorded since the last seal
    #[must_use]
    pub const fn logs_since(&self) -> u32 {
        self.logs_since
    }

    /// Outstanding obligations
    #[must_use]
    pub const fn need(&self) -> NeedSet {
        self.need
    }

    /// Buffered entries not yet flushed to storage
    #[must_use]
    pub fn pending(&self) -> &[Entry] {
        &self.out
    }

    /// The block being built on, if its seal is confirmed
    #[must_use]
    pub fn sealed_block(&self) -> Option<SealedBlock> {
        if !self.has_complete_block() {
            return None;
        }
        Some(SealedBlock {
            hash: self.block_hash,
            number: self.block_num,
            timestamp: self.timestamp,
        })
    }

    /// The last log, if it is fully recorded
    #[must_use]
    pub fn init_message(&self) -> Option<InitMessage> {
        if !self.has_readable_log() {
            return None;
        }
        Some(InitMessage {
            hash: self.log_hash,
            log_idx: self.logs_since - 1,
        })
    }

    /// The executing message of the last log, if the block is sealed, the
    /// log is fully recorded, and it has one
    #[must_use]
    pub fn exec_message(&self) -> Option<&ExecutingMessage> {
        if self.has_complete_block() && self.has_readable_log() {
            self.exec.complete()
        } else {
            None
        }
    }

    pub(crate) fn has_complete_block(&self) -> bool {
        !self.need.contains(Need::CanonicalHash)
    }

    pub(crate) fn has_incomplete_log(&self) -> bool {
        self.need.any(&[Need::InitiatingEvent, Need::ExecutingLink, Need::ExecutingCheck])
    }

    pub(crate) fn has_readable_log(&self) -> bool {
        self.logs_since > 0 && !self.has_incomplete_log()
    }

    /// Log count once the current log completes, `None` if the count is
    /// exhausted
    pub(crate) fn logs_since_after_log(&self) -> Option<u32> {
        self.logs_since.checked_add(1)
    }

    /// Forget the log bookkeeping of the previous block
    pub(crate) fn reset_logs(&mut self) {
        self.logs_since = 0;
        self.log_hash = TruncatedHash::zero();
        self.exec = PendingExec::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslog_core::ChainId;

    #[test]
    fn test_new_is_empty() {
        let ctx = LogContext::new();
        assert_eq!(ctx.next_index(), 0);
        assert_eq!(ctx.logs_since(), 0);
        assert!(ctx.need().is_empty());
        assert!(ctx.pending().is_empty());
        assert!(ctx.init_message().is_none());
        assert!(ctx.exec_message().is_none());
    }

    #[test]
    fn test_sealed_block_hidden_while_hash_pending() {
        let mut ctx = LogContext::new();
        ctx.block_num = 5;
        assert_eq!(ctx.sealed_block().map(|b| b.number), Some(5));

        ctx.need.add(Need::CanonicalHash);
        assert!(ctx.sealed_block().is_none());
    }

    #[test]
    fn test_init_message_requires_complete_log() {
        let mut ctx = LogContext::new();
        ctx.logs_since = 2;
        ctx.log_hash = TruncatedHash::from_bytes([1; 20]);
        assert_eq!(ctx.init_message().map(|m| m.log_idx), Some(1));

        ctx.need.add(Need::ExecutingCheck);
        assert!(ctx.init_message().is_none());
    }

    #[test]
    fn test_exec_message_only_when_complete() {
        let msg = ExecutingMessage::new(ChainId::new(1), 2, 3, 4, TruncatedHash::zero());
        let mut ctx = LogContext::new();
        ctx.logs_since = 1;

        ctx.exec = PendingExec::Queued(msg);
        assert!(ctx.exec_message().is_none());

        ctx.exec = PendingExec::Complete(msg);
        assert_eq!(ctx.exec_message(), Some(&msg));

        ctx.need.add(Need::CanonicalHash);
        assert!(ctx.exec_message().is_none());
    }

    #[test]
    fn test_reset_logs() {
        let mut ctx = LogContext::new();
        ctx.logs_since = 3;
        ctx.log_hash = TruncatedHash::from_bytes([2; 20]);
        ctx.exec = PendingExec::Complete(ExecutingMessage::new(
            ChainId::new(1),
            1,
            1,
            1,
            TruncatedHash::zero(),
        ));
        ctx.reset_logs();
        assert_eq!(ctx.logs_since, 0);
        assert!(ctx.log_hash.is_zero());
        assert_eq!(ctx.exec, PendingExec::None);
    }
}
