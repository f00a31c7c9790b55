//! Cross-chain executing messages.

use crate::hash::TruncatedHash;
use crate::id::ChainId;
use serde::{Deserialize, Serialize};

/// A pointer from a log event to the initiating event it executes on
/// another chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutingMessage {
    /// Chain the initiating event lives on
    pub chain: ChainId,
    /// Block number of the initiating event
    pub block_num: u64,
    /// Log index of the initiating event within its block
    pub log_idx: u32,
    /// Timestamp of the initiating block
    pub timestamp: u64,
    /// Hash of the initiating event
    pub hash: TruncatedHash,
}

impl ExecutingMessage {
    /// Create a new executing message
    #[must_use]
    pub const fn new(
        chain: ChainId,
        block_num: u64,
        log_idx: u32,
        timestamp: u64,
        hash: TruncatedHash,
    ) -> Self {
        Self {
            chain,
            block_num,
            log_idx,
            timestamp,
            hash,
        }
    }
}

impl std::fmt::Display for ExecutingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}@{} ({})",
            self.chain, self.block_num, self.log_idx, self.timestamp, self.hash
        )
    }
}
