//! Identifiers for chains and blocks.

use crate::error::{CoreError, CoreResult};
use crate::hash::Hash;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Chain identifier
///
/// Stored in 4 bytes in an executing link entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ChainId(u32);

impl ChainId {
    /// Create from raw value
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get raw value
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain_{}", self.0)
    }
}

impl From<u32> for ChainId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A block, identified by hash and number
///
/// The default value is the zero identity: zero hash, number 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockId {
    /// Block hash
    pub hash: Hash,
    /// Block number
    pub number: u64,
}

impl BlockId {
    /// Create a new block id
    #[must_use]
    pub const fn new(hash: Hash, number: u64) -> Self {
        Self { hash, number }
    }

    /// Check for the zero identity
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.hash.is_zero() && self.number == 0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hash, self.number)
    }
}

impl FromStr for BlockId {
    type Err = CoreError;

    /// Parse the `<hash>:<number>` form produced by `Display`
    fn from_str(s: &str) -> CoreResult<Self> {
        let (hash, number) = s.split_once(':').ok_or_else(|| CoreError::InvalidBlockId {
            reason: format!("expected <hash>:<number>, got {s:?}"),
        })?;
        let number = number.parse().map_err(|_| CoreError::InvalidBlockId {
            reason: format!("invalid block number {number:?}"),
        })?;
        Ok(Self {
            hash: Hash::from_hex(hash)?,
            number,
        })
    }
}
