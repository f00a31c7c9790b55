//! Synthesizing implied entries.
//!
//! Given the outstanding [`Need`]s, the cursor can work out the next entry
//! on its own: a checkpoint on every search interval, the canonical hash
//! after every checkpoint, padding so a log with an executing message is
//! never split by a checkpoint, and the entries of the log being applied.

use crate::entry::{EncodeEntry, EntryType, SEARCH_CHECKPOINT_FREQUENCY};
use crate::error::{LogError, LogResult};
use crate::need::Need;
use crate::record::{
    CanonicalHash, ExecutingCheck, ExecutingLink, InitiatingEvent, Padding, SearchCheckpoint,
};
use crate::state::{LogContext, PendingExec};
use tracing::trace;

/// Upper bound on single inference steps per drain
pub const INFER_SANITY_LIMIT: usize = 10;

/// Order in which obligations are served
const INFER_ORDER: [Need; 7] = [
    Need::SearchCheckpoint,
    Need::CanonicalHash,
    Need::Padding,
    Need::Padding2,
    Need::InitiatingEvent,
    Need::ExecutingLink,
    Need::ExecutingCheck,
];

/// Outcome of a single inference step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inferred {
    /// An entry of this type was appended to the output buffer
    Appended(EntryType),
    /// Obligations changed but nothing was appended yet
    Rescheduled,
    /// Nothing more is implied
    Done,
}

impl LogContext {
    fn append_entry(&mut self, record: &impl EncodeEntry) -> EntryType {
        let kind = record.entry_type();
        let entry = record.encode();
        trace!(index = self.next_index, entry_type = %kind, "appended entry");
        self.out.push(entry);
        self.next_index += 1;
        kind
    }

    fn next_log_count(&self) -> LogResult<u32> {
        self.logs_since_after_log().ok_or_else(|| LogError::OutOfOrder {
            reason: format!("block already holds {} logs", self.logs_since),
        })
    }

    /// Produce the next implied entry, if any
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidExecutingMessage`] if the executing
    /// message of the current log cannot be written, or
    /// [`LogError::OutOfOrder`] if completing the log would overflow the
    /// block's log count
    pub fn infer(&mut self) -> LogResult<Inferred> {
        // Every search interval starts with a checkpoint, whatever else is pending.
        if self.next_index % SEARCH_CHECKPOINT_FREQUENCY == 0 {
            self.need.add(Need::SearchCheckpoint);
        }
        let Some(need) = INFER_ORDER.into_iter().find(|n| self.need.contains(*n)) else {
            return Ok(Inferred::Done);
        };
        let kind = match need {
            Need::SearchCheckpoint => {
                let kind = self.append_entry(&SearchCheckpoint::new(
                    self.block_num,
                    self.logs_since,
                    self.timestamp,
                ));
                self.need.add(Need::CanonicalHash);
                self.need.remove(Need::SearchCheckpoint);
                kind
            }
            Need::CanonicalHash => {
                let kind = self.append_entry(&CanonicalHash::new(self.block_hash));
                self.need.remove(Need::CanonicalHash);
                kind
            }
            Need::Padding | Need::Padding2 => {
                let kind = self.append_entry(&Padding);
                self.need.remove(need);
                kind
            }
            Need::InitiatingEvent => {
                let has_exec_msg = self.exec.queued().is_some();
                // Event, link and check take 3 entries; pad past the next
                // checkpoint rather than let it split them.
                if has_exec_msg {
                    let slot = self.next_index % SEARCH_CHECKPOINT_FREQUENCY;
                    if slot == SEARCH_CHECKPOINT_FREQUENCY - 1 {
                        self.need.add(Need::Padding);
                        return Ok(Inferred::Rescheduled);
                    }
                    if slot == SEARCH_CHECKPOINT_FREQUENCY - 2 {
                        self.need.add(Need::Padding);
                        self.need.add(Need::Padding2);
                        return Ok(Inferred::Rescheduled);
                    }
                }
                let logs_since = if has_exec_msg {
                    self.logs_since
                } else {
                    self.next_log_count()?
                };
                let kind = self.append_entry(&InitiatingEvent::new(self.log_hash, has_exec_msg));
                self.need.remove(Need::InitiatingEvent);
                self.logs_since = logs_since;
                kind
            }
            Need::ExecutingLink => {
                let msg = self.exec.queued().ok_or_else(|| LogError::InvalidExecutingMessage {
                    reason: "no executing message to link".to_string(),
                })?;
                let link = ExecutingLink::from_message(msg)?;
                let kind = self.append_entry(&link);
                self.need.remove(Need::ExecutingLink);
                self.need.add(Need::ExecutingCheck);
                kind
            }
            Need::ExecutingCheck => {
                let msg = *self.exec.queued().ok_or_else(|| LogError::InvalidExecutingMessage {
                    reason: "executing message hash is not known".to_string(),
                })?;
                let logs_since = self.next_log_count()?;
                let kind = self.append_entry(&ExecutingCheck::new(msg.hash));
                self.exec = PendingExec::Complete(msg);
                self.need.remove(Need::ExecutingCheck);
                self.logs_since = logs_since;
                kind
            }
        };
        Ok(Inferred::Appended(kind))
    }

    /// Append implied entries until nothing more is implied
    ///
    /// # Errors
    ///
    /// Same as [`LogContext::infer`]
    ///
    /// # Panics
    ///
    /// Panics if inference does not settle within [`INFER_SANITY_LIMIT`]
    /// steps, which means the cursor invariants are broken.
    pub fn infer_full(&mut self) -> LogResult<()> {
        for _ in 0..INFER_SANITY_LIMIT {
            if self.infer()? == Inferred::Done {
                return Ok(());
            }
        }
        panic!(
            "entry inference hit sanity limit at index {} with needs {}",
            self.next_index, self.need
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DecodeEntry;
    use crate::record::Record;
    use crosslog_core::{ChainId, ExecutingMessage, TruncatedHash};

    fn hash(byte: u8) -> TruncatedHash {
        TruncatedHash::from_bytes([byte; 20])
    }

    fn decoded(ctx: &LogContext) -> Vec<Record> {
        ctx.pending().iter().map(|e| Record::decode(e).unwrap()).collect()
    }

    #[test]
    fn test_nothing_to_infer() {
        let mut ctx = LogContext::new();
        ctx.next_index = 3;
        assert_eq!(ctx.infer().unwrap(), Inferred::Done);
        assert!(ctx.pending().is_empty());
        assert_eq!(ctx.next_index(), 3);
    }

    #[test]
    fn test_interval_forces_checkpoint() {
        let mut ctx = LogContext::new();
        ctx.block_num = 4;
        ctx.timestamp = 40;
        ctx.block_hash = hash(4);
        ctx.infer_full().unwrap();
        assert_eq!(
            decoded(&ctx),
            vec![
                Record::SearchCheckpoint(SearchCheckpoint::new(4, 0, 40)),
                Record::CanonicalHash(CanonicalHash::new(hash(4))),
            ]
        );
        assert_eq!(ctx.next_index(), 2);
        assert!(ctx.need().is_empty());
    }

    #[test]
    fn test_checkpoint_beats_pending_log() {
        let mut ctx = LogContext::new();
        ctx.next_index = SEARCH_CHECKPOINT_FREQUENCY;
        ctx.need.add(Need::InitiatingEvent);
        assert_eq!(
            ctx.infer().unwrap(),
            Inferred::Appended(EntryType::SearchCheckpoint)
        );
        assert_eq!(
            ctx.infer().unwrap(),
            Inferred::Appended(EntryType::CanonicalHash)
        );
        assert_eq!(
            ctx.infer().unwrap(),
            Inferred::Appended(EntryType::InitiatingEvent)
        );
        assert_eq!(ctx.logs_since(), 1);
    }

    #[test]
    fn test_padding_one_slot_before_boundary() {
        let msg = ExecutingMessage::new(ChainId::new(1), 1, 0, 1, hash(9));
        let mut ctx = LogContext::new();
        ctx.next_index = SEARCH_CHECKPOINT_FREQUENCY - 1;
        ctx.exec = PendingExec::Queued(msg);
        ctx.need.add(Need::InitiatingEvent);
        ctx.need.add(Need::ExecutingLink);
        ctx.need.add(Need::ExecutingCheck);

        assert_eq!(ctx.infer().unwrap(), Inferred::Rescheduled);
        assert!(ctx.need().contains(Need::Padding));
        assert!(!ctx.need().contains(Need::Padding2));

        ctx.infer_full().unwrap();
        let kinds: Vec<EntryType> = ctx.pending().iter().filter_map(|e| e.entry_type()).collect();
        assert_eq!(
            kinds,
            vec![
                EntryType::Padding,
                EntryType::SearchCheckpoint,
                EntryType::CanonicalHash,
                EntryType::InitiatingEvent,
                EntryType::ExecutingLink,
                EntryType::ExecutingCheck,
            ]
        );
        assert_eq!(ctx.exec, PendingExec::Complete(msg));
        assert_eq!(ctx.logs_since(), 1);
    }

    #[test]
    fn test_padding_two_slots_before_boundary() {
        let msg = ExecutingMessage::new(ChainId::new(1), 1, 0, 1, hash(9));
        let mut ctx = LogContext::new();
        ctx.next_index = 2 * SEARCH_CHECKPOINT_FREQUENCY - 2;
        ctx.exec = PendingExec::Queued(msg);
        ctx.need.add(Need::InitiatingEvent);
        ctx.need.add(Need::ExecutingLink);
        ctx.need.add(Need::ExecutingCheck);

        ctx.infer_full().unwrap();
        let kinds: Vec<EntryType> = ctx.pending().iter().filter_map(|e| e.entry_type()).collect();
        assert_eq!(
            kinds,
            vec![
                EntryType::Padding,
                EntryType::Padding,
                EntryType::SearchCheckpoint,
                EntryType::CanonicalHash,
                EntryType::InitiatingEvent,
                EntryType::ExecutingLink,
                EntryType::ExecutingCheck,
            ]
        );
    }

    #[test]
    fn test_no_padding_without_exec() {
        let mut ctx = LogContext::new();
        ctx.next_index = SEARCH_CHECKPOINT_FREQUENCY - 1;
        ctx.need.add(Need::InitiatingEvent);
        assert_eq!(
            ctx.infer().unwrap(),
            Inferred::Appended(EntryType::InitiatingEvent)
        );
    }

    #[test]
    fn test_link_without_message_fails() {
        let mut ctx = LogContext::new();
        ctx.next_index = 1;
        ctx.need.add(Need::ExecutingLink);
        let err = ctx.infer().unwrap_err();
        assert!(matches!(err, LogError::InvalidExecutingMessage { .. }));
        assert!(ctx.pending().is_empty());
    }

    #[test]
    fn test_check_with_unknown_hash_fails() {
        let mut ctx = LogContext::new();
        ctx.next_index = 1;
        ctx.exec = PendingExec::Linked(ExecutingLink::new(ChainId::new(1), 1, 1, 1).unwrap());
        ctx.need.add(Need::ExecutingCheck);
        assert!(matches!(
            ctx.infer().unwrap_err(),
            LogError::InvalidExecutingMessage { .. }
        ));
    }

    #[test]
    fn test_infer_full_idempotent() {
        let mut ctx = LogContext::new();
        ctx.infer_full().unwrap();
        let before = ctx.clone();
        ctx.infer_full().unwrap();
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_log_count_overflow_appends_nothing() {
        let mut ctx = LogContext::new();
        ctx.next_index = 3;
        ctx.block_num = 1;
        ctx.logs_since = u32::MAX;
        ctx.log_hash = hash(5);
        ctx.need.add(Need::InitiatingEvent);
        let before = ctx.clone();
        let err = ctx.infer().unwrap_err();
        assert!(err.is_out_of_order());
        assert_eq!(ctx, before);
        assert!(ctx.pending().is_empty());
    }
}
