//! Applying blocks and logs on top of the cursor.
//!
//! Each call checks the new block or log against the current state, records
//! it, and then lets inference append every entry it implies to the output
//! buffer.

use crate::error::{LogError, LogResult};
use crate::need::Need;
use crate::record::ExecutingLink;
use crate::state::{LogContext, PendingExec};
use crosslog_core::{BlockId, ExecutingMessage, Hash, TruncatedHash};
use tracing::{debug, warn};

impl LogContext {
    /// Start an empty cursor from a block that is already sealed
    ///
    /// The block is written as the opening checkpoint and canonical hash,
    /// so the next block can be sealed on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotEmpty`] if any entry was already applied or
    /// emitted
    pub fn force_block(&mut self, block: BlockId, timestamp: u64) -> LogResult<()> {
        if self.next_index != 0 {
            return Err(LogError::NotEmpty {
                next_index: self.next_index,
            });
        }
        self.block_hash = block.hash.truncate();
        self.block_num = block.number;
        self.timestamp = timestamp;
        self.reset_logs();
        self.need.clear();
        self.out.clear();
        debug!(block = %block, timestamp, "bootstrapped log context");
        self.infer_full()
    }

    /// Seal a block on top of the current state
    ///
    /// No further logs of the previous block may be applied afterwards.
    /// The first block sealed on an empty cursor is accepted as is.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Conflict`] if the block does not build on the
    /// last sealed block: parent hash mismatch, block number not exactly one
    /// higher, or timestamp going backwards
    pub fn seal_block(&mut self, parent: Hash, block: BlockId, timestamp: u64) -> LogResult<()> {
        if self.next_index != 0 {
            self.infer_full()?;
            self.check_seal(parent, block, timestamp)?;
        }
        self.block_hash = block.hash.truncate();
        self.block_num = block.number;
        self.timestamp = timestamp;
        self.reset_logs();
        self.need.add(Need::SearchCheckpoint);
        debug!(block = %block, timestamp, next_index = self.next_index, "sealing block");
        self.infer_full()
    }

    fn check_seal(&self, parent: Hash, block: BlockId, timestamp: u64) -> LogResult<()> {
        let conflict = |reason: String| {
            warn!(%reason, "rejected block seal");
            Err(LogError::Conflict { reason })
        };
        if self.block_hash != parent.truncate() {
            return conflict(format!(
                "cannot apply block {block} (parent {parent}) on top of {}",
                self.block_hash
            ));
        }
        if !self.block_hash.is_zero() && self.block_num.checked_add(1) != Some(block.number) {
            return conflict(format!(
                "cannot apply block {} on top of {}",
                block.number, self.block_num
            ));
        }
        if self.timestamp > timestamp {
            return conflict(format!(
                "block timestamp {timestamp} must be equal or larger than current timestamp {}",
                self.timestamp
            ));
        }
        Ok(())
    }

    /// Apply a log on top of the current state
    ///
    /// The block the log belongs to must be sealed first, and logs must
    /// arrive index by index.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::OutOfOrder`] for a log of the genesis block, a
    /// log of any block other than the last sealed one, or a log index that
    /// is not the next one or would overflow the block's log count;
    /// [`LogError::BlockNotSealed`] if the last block's seal is not
    /// confirmed; [`LogError::InvalidExecutingMessage`] if the executing
    /// message cannot be encoded. Nothing is recorded on error.
    pub fn apply_log(
        &mut self,
        parent_block: BlockId,
        log_idx: u32,
        log_hash: TruncatedHash,
        exec_msg: Option<ExecutingMessage>,
    ) -> LogResult<()> {
        if parent_block.is_zero() {
            return Err(LogError::OutOfOrder {
                reason: "genesis does not have logs".to_string(),
            });
        }
        self.infer_full()?;
        if !self.has_complete_block() {
            if self.block_num == 0 {
                return Err(LogError::OutOfOrder {
                    reason: "should not have logs in block 0".to_string(),
                });
            }
            return Err(LogError::BlockNotSealed {
                reason: "cannot append log before last known block is sealed".to_string(),
            });
        }
        if self.block_hash != parent_block.hash.truncate() {
            return Err(LogError::OutOfOrder {
                reason: format!(
                    "log builds on top of block {parent_block}, but have block {}",
                    self.block_hash
                ),
            });
        }
        if self.block_num != parent_block.number {
            return Err(LogError::OutOfOrder {
                reason: format!(
                    "log builds on top of block {}, but have block {}",
                    parent_block.number, self.block_num
                ),
            });
        }
        if log_idx != self.logs_since {
            return Err(LogError::OutOfOrder {
                reason: format!(
                    "expected event index {}, cannot append {log_idx}",
                    self.logs_since
                ),
            });
        }
        if self.logs_since_after_log().is_none() {
            return Err(LogError::OutOfOrder {
                reason: format!("block already holds {} logs", self.logs_since),
            });
        }
        if let Some(msg) = &exec_msg {
            ExecutingLink::from_message(msg)?;
        }

        self.log_hash = log_hash;
        self.need.add(Need::InitiatingEvent);
        self.exec = match exec_msg {
            Some(msg) => {
                self.need.add(Need::ExecutingLink);
                self.need.add(Need::ExecutingCheck);
                PendingExec::Queued(msg)
            }
            None => PendingExec::None,
        };
        debug!(
            block = parent_block.number,
            log_idx,
            executing = exec_msg.is_some(),
            next_index = self.next_index,
            "applying log"
        );
        self.infer_full()
    }
}
