//! Replaying stored entries into the cursor.

use crate::entry::{DecodeEntry, Entry};
use crate::error::{LogError, LogResult};
use crate::need::Need;
use crate::record::{
    CanonicalHash, ExecutingCheck, ExecutingLink, InitiatingEvent, Padding, Record,
    SearchCheckpoint,
};
use crate::state::{LogContext, PendingExec};
use crosslog_core::{ExecutingMessage, TruncatedHash};
use tracing::trace;

impl LogContext {
    /// Apply a stored entry on top of the current state
    ///
    /// On success the cursor advances by one entry. Errors are wrapped in
    /// [`LogError::Entry`] with the entry type, index, and raw bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the entry is malformed, has an unknown type, or is
    /// not allowed at this point of the sequence
    ///
    /// # Panics
    ///
    /// Panics if the output buffer is not empty. Buffered entries must be
    /// flushed before stored entries can be replayed.
    pub fn apply_entry(&mut self, entry: &Entry) -> LogResult<()> {
        self.process_entry(entry).map_err(|err| LogError::Entry {
            entry_type: entry.type_name(),
            index: self.next_index,
            raw: entry.to_hex(),
            source: Box::new(err),
        })
    }

    fn process_entry(&mut self, entry: &Entry) -> LogResult<()> {
        assert!(
            self.out.is_empty(),
            "can only apply entries while the output buffer is empty ({} buffered)",
            self.out.len()
        );
        match Record::decode(entry)? {
            Record::SearchCheckpoint(checkpoint) => self.replay_checkpoint(checkpoint),
            Record::CanonicalHash(canonical) => self.replay_canonical_hash(canonical)?,
            Record::InitiatingEvent(event) => self.replay_initiating_event(event)?,
            Record::ExecutingLink(link) => self.replay_executing_link(link)?,
            Record::ExecutingCheck(check) => self.replay_executing_check(check)?,
            Record::Padding(padding) => self.replay_padding(padding),
        }
        trace!(index = self.next_index, entry_type = %entry.type_name(), "replayed entry");
        self.next_index += 1;
        Ok(())
    }

    fn replay_checkpoint(&mut self, checkpoint: SearchCheckpoint) {
        self.block_num = checkpoint.block_num;
        self.block_hash = TruncatedHash::zero();
        // Adopted as stored; a checkpoint in the middle of a block carries
        // the count so far.
        self.logs_since = checkpoint.logs_since;
        self.timestamp = checkpoint.timestamp;
        self.need.add(Need::CanonicalHash);
        if self.logs_since == 0 {
            self.log_hash = TruncatedHash::zero();
            self.exec = PendingExec::None;
        }
    }

    fn replay_canonical_hash(&mut self, canonical: CanonicalHash) -> LogResult<()> {
        if !self.need.contains(Need::CanonicalHash) {
            return Err(LogError::UnexpectedEntry {
                reason: "not ready for canonical hash entry, already sealed the last block"
                    .to_string(),
            });
        }
        self.block_hash = canonical.hash;
        self.need.remove(Need::CanonicalHash);
        Ok(())
    }

    fn replay_initiating_event(&mut self, event: InitiatingEvent) -> LogResult<()> {
        if !self.has_complete_block() {
            return Err(LogError::BlockNotSealed {
                reason: "did not complete block seal, cannot add log".to_string(),
            });
        }
        if self.has_incomplete_log() {
            return Err(LogError::LogInProgress);
        }
        let logs_since = if event.has_exec_msg {
            self.logs_since
        } else {
            self.completed_log_count()?
        };
        self.exec = PendingExec::None;
        self.log_hash = event.hash;
        self.logs_since = logs_since;
        if event.has_exec_msg {
            self.need.add(Need::ExecutingLink);
            self.need.add(Need::ExecutingCheck);
        }
        self.need.remove(Need::InitiatingEvent);
        Ok(())
    }

    fn replay_executing_link(&mut self, link: ExecutingLink) -> LogResult<()> {
        if !self.need.contains(Need::ExecutingLink) {
            return Err(LogError::UnexpectedEntry {
                reason: "unexpected executing link".to_string(),
            });
        }
        self.exec = PendingExec::Linked(link);
        self.need.remove(Need::ExecutingLink);
        self.need.add(Need::ExecutingCheck);
        Ok(())
    }

    fn replay_executing_check(&mut self, check: ExecutingCheck) -> LogResult<()> {
        if self.need.contains(Need::ExecutingLink) {
            return Err(LogError::UnexpectedEntry {
                reason: "need executing link to be applied before the check part".to_string(),
            });
        }
        if !self.need.contains(Need::ExecutingCheck) {
            return Err(LogError::UnexpectedEntry {
                reason: "unexpected executing check".to_string(),
            });
        }
        let logs_since = self.completed_log_count()?;
        self.exec = match self.exec {
            PendingExec::Linked(link) => PendingExec::Complete(link.with_hash(check.hash)),
            PendingExec::Queued(msg) => PendingExec::Complete(ExecutingMessage {
                hash: check.hash,
                ..msg
            }),
            PendingExec::None | PendingExec::Complete(_) => {
                return Err(LogError::UnexpectedEntry {
                    reason: "executing check without a pending executing link".to_string(),
                });
            }
        };
        self.need.remove(Need::ExecutingCheck);
        self.logs_since = logs_since;
        Ok(())
    }

    fn completed_log_count(&self) -> LogResult<u32> {
        self.logs_since_after_log().ok_or_else(|| LogError::UnexpectedEntry {
            reason: format!("log count overflows after {} logs since seal", self.logs_since),
        })
    }

    fn replay_padding(&mut self, _padding: Padding) {
        if self.need.contains(Need::Padding) {
            self.need.remove(Need::Padding);
        } else {
            self.need.remove(Need::Padding2);
        }
    }
}
