//! Typed entry records and their byte layouts.
//!
//! ```text
//! 0 searchCheckpoint <0><block number: 8><logs since: 4><timestamp: 8>  = 21 bytes
//! 1 canonicalHash    <1><truncated block hash: 20>                     = 21 bytes
//! 2 initiatingEvent  <2><event flags: 1><truncated event hash: 20>     = 22 bytes
//! 3 executingLink    <3><chain: 4><block number: 8><log index: 3><timestamp: 8> = 24 bytes
//! 4 executingCheck   <4><truncated event hash: 20>                     = 21 bytes
//! 5 padding          <5><zeros: 23>                                    = 24 bytes
//! ```

use crate::entry::{DecodeEntry, EncodeEntry, Entry, EntryType, expect_type};
use crate::error::{LogError, LogResult};
use crosslog_core::{ChainId, ExecutingMessage, TruncatedHash};

/// Event flag: an executing link and check follow the initiating event
pub const EVENT_FLAG_HAS_EXECUTING_MESSAGE: u8 = 0x01;

/// Largest log index that fits in the 3-byte executing link field
pub const MAX_LOG_INDEX: u32 = (1 << 24) - 1;

fn put(entry: &mut Entry, offset: usize, bytes: &[u8]) {
    entry.bytes_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn get<const N: usize>(entry: &Entry, offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&entry.as_bytes()[offset..offset + N]);
    out
}

/// Marks a block seal and/or a fixed search interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCheckpoint {
    /// Number of the last sealed block
    pub block_num: u64,
    /// Logs recorded since that block was sealed
    pub logs_since: u32,
    /// Timestamp of the last sealed block
    pub timestamp: u64,
}

impl SearchCheckpoint {
    /// Create a new checkpoint record
    #[must_use]
    pub const fn new(block_num: u64, logs_since: u32, timestamp: u64) -> Self {
        Self {
            block_num,
            logs_since,
            timestamp,
        }
    }
}

impl EncodeEntry for SearchCheckpoint {
    fn entry_type(&self) -> EntryType {
        EntryType::SearchCheckpoint
    }

    fn encode(&self) -> Entry {
        let mut entry = Entry::with_type(self.entry_type());
        put(&mut entry, 1, &self.block_num.to_be_bytes());
        put(&mut entry, 9, &self.logs_since.to_be_bytes());
        put(&mut entry, 13, &self.timestamp.to_be_bytes());
        entry
    }
}

impl DecodeEntry for SearchCheckpoint {
    fn decode(entry: &Entry) -> LogResult<Self> {
        expect_type(entry, EntryType::SearchCheckpoint)?;
        Ok(Self {
            block_num: u64::from_be_bytes(get(entry, 1)),
            logs_since: u32::from_be_bytes(get(entry, 9)),
            timestamp: u64::from_be_bytes(get(entry, 13)),
        })
    }
}

/// Confirms the hash of the block named by the preceding checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalHash {
    /// Truncated block hash
    pub hash: TruncatedHash,
}

impl CanonicalHash {
    /// Create a new canonical hash record
    #[must_use]
    pub const fn new(hash: TruncatedHash) -> Self {
        Self { hash }
    }
}

impl EncodeEntry for CanonicalHash {
    fn entry_type(&self) -> EntryType {
        EntryType::CanonicalHash
    }

    fn encode(&self) -> Entry {
        let mut entry = Entry::with_type(self.entry_type());
        put(&mut entry, 1, self.hash.as_bytes());
        entry
    }
}

impl DecodeEntry for CanonicalHash {
    fn decode(entry: &Entry) -> LogResult<Self> {
        expect_type(entry, EntryType::CanonicalHash)?;
        Ok(Self {
            hash: TruncatedHash::from_bytes(get(entry, 1)),
        })
    }
}

/// A log event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiatingEvent {
    /// Whether an executing link and check follow
    pub has_exec_msg: bool,
    /// Truncated event hash
    pub hash: TruncatedHash,
}

impl InitiatingEvent {
    /// Create a new initiating event record
    #[must_use]
    pub const fn new(hash: TruncatedHash, has_exec_msg: bool) -> Self {
        Self { has_exec_msg, hash }
    }

    /// The event flags byte
    #[must_use]
    pub const fn flags(&self) -> u8 {
        if self.has_exec_msg {
            EVENT_FLAG_HAS_EXECUTING_MESSAGE
        } else {
            0
        }
    }
}

impl EncodeEntry for InitiatingEvent {
    fn entry_type(&self) -> EntryType {
        EntryType::InitiatingEvent
    }

    fn encode(&self) -> Entry {
        let mut entry = Entry::with_type(self.entry_type());
        put(&mut entry, 1, &[self.flags()]);
        put(&mut entry, 2, self.hash.as_bytes());
        entry
    }
}

impl DecodeEntry for InitiatingEvent {
    /// Reserved flag bits are ignored
    fn decode(entry: &Entry) -> LogResult<Self> {
        expect_type(entry, EntryType::InitiatingEvent)?;
        let [flags] = get::<1>(entry, 1);
        Ok(Self {
            has_exec_msg: flags & EVENT_FLAG_HAS_EXECUTING_MESSAGE != 0,
            hash: TruncatedHash::from_bytes(get(entry, 2)),
        })
    }
}

/// Identifies the initiating event that a log executes
///
/// The log index is limited to [`MAX_LOG_INDEX`]; construction checks it,
/// so every value of this type encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutingLink {
    chain: ChainId,
    block_num: u64,
    log_idx: u32,
    timestamp: u64,
}

impl ExecutingLink {
    /// Create a new executing link record
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidExecutingMessage`] if `log_idx` does not
    /// fit in 3 bytes
    pub fn new(chain: ChainId, block_num: u64, log_idx: u32, timestamp: u64) -> LogResult<Self> {
        if log_idx > MAX_LOG_INDEX {
            return Err(LogError::InvalidExecutingMessage {
                reason: format!("log index {log_idx} is too large, max is {MAX_LOG_INDEX}"),
            });
        }
        Ok(Self {
            chain,
            block_num,
            log_idx,
            timestamp,
        })
    }

    /// Take the link fields of an executing message
    ///
    /// # Errors
    ///
    /// Same as [`ExecutingLink::new`]
    pub fn from_message(msg: &ExecutingMessage) -> LogResult<Self> {
        Self::new(msg.chain, msg.block_num, msg.log_idx, msg.timestamp)
    }

    /// Complete the link with the hash from the executing check
    #[must_use]
    pub const fn with_hash(&self, hash: TruncatedHash) -> ExecutingMessage {
        ExecutingMessage::new(self.chain, self.block_num, self.log_idx, self.timestamp, hash)
    }

    /// Chain of the initiating event
    #[must_use]
    pub const fn chain(&self) -> ChainId {
        self.chain
    }

    /// Block number of the initiating event
    #[must_use]
    pub const fn block_num(&self) -> u64 {
        self.block_num
    }

    /// Log index of the initiating event
    #[must_use]
    pub const fn log_idx(&self) -> u32 {
        self.log_idx
    }

    /// Timestamp of the initiating block
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl EncodeEntry for ExecutingLink {
    fn entry_type(&self) -> EntryType {
        EntryType::ExecutingLink
    }

    fn encode(&self) -> Entry {
        let mut entry = Entry::with_type(self.entry_type());
        put(&mut entry, 1, &self.chain.as_u32().to_be_bytes());
        put(&mut entry, 5, &self.block_num.to_be_bytes());
        put(&mut entry, 13, &self.log_idx.to_be_bytes()[1..]);
        put(&mut entry, 16, &self.timestamp.to_be_bytes());
        entry
    }
}

impl DecodeEntry for ExecutingLink {
    fn decode(entry: &Entry) -> LogResult<Self> {
        expect_type(entry, EntryType::ExecutingLink)?;
        let [a, b, c] = get::<3>(entry, 13);
        Ok(Self {
            chain: ChainId::new(u32::from_be_bytes(get(entry, 1))),
            block_num: u64::from_be_bytes(get(entry, 5)),
            log_idx: u32::from_be_bytes([0, a, b, c]),
            timestamp: u64::from_be_bytes(get(entry, 16)),
        })
    }
}

/// Hash of the initiating event named by the preceding executing link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutingCheck {
    /// Truncated event hash
    pub hash: TruncatedHash,
}

impl ExecutingCheck {
    /// Create a new executing check record
    #[must_use]
    pub const fn new(hash: TruncatedHash) -> Self {
        Self { hash }
    }
}

impl EncodeEntry for ExecutingCheck {
    fn entry_type(&self) -> EntryType {
        EntryType::ExecutingCheck
    }

    fn encode(&self) -> Entry {
        let mut entry = Entry::with_type(self.entry_type());
        put(&mut entry, 1, self.hash.as_bytes());
        entry
    }
}

impl DecodeEntry for ExecutingCheck {
    fn decode(entry: &Entry) -> LogResult<Self> {
        expect_type(entry, EntryType::ExecutingCheck)?;
        Ok(Self {
            hash: TruncatedHash::from_bytes(get(entry, 1)),
        })
    }
}

/// Filler that moves a multi-entry log past the next search checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding;

impl EncodeEntry for Padding {
    fn entry_type(&self) -> EntryType {
        EntryType::Padding
    }

    fn encode(&self) -> Entry {
        Entry::with_type(self.entry_type())
    }
}

impl DecodeEntry for Padding {
    fn decode(entry: &Entry) -> LogResult<Self> {
        expect_type(entry, EntryType::Padding)?;
        Ok(Self)
    }
}

/// Any decoded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// Type 0
    SearchCheckpoint(SearchCheckpoint),
    /// Type 1
    CanonicalHash(CanonicalHash),
    /// Type 2
    InitiatingEvent(InitiatingEvent),
    /// Type 3
    ExecutingLink(ExecutingLink),
    /// Type 4
    ExecutingCheck(ExecutingCheck),
    /// Type 5
    Padding(Padding),
}

impl EncodeEntry for Record {
    fn entry_type(&self) -> EntryType {
        match self {
            Self::SearchCheckpoint(_) => EntryType::SearchCheckpoint,
            Self::CanonicalHash(_) => EntryType::CanonicalHash,
            Self::InitiatingEvent(_) => EntryType::InitiatingEvent,
            Self::ExecutingLink(_) => EntryType::ExecutingLink,
            Self::ExecutingCheck(_) => EntryType::ExecutingCheck,
            Self::Padding(_) => EntryType::Padding,
        }
    }

    fn encode(&self) -> Entry {
        match self {
            Self::SearchCheckpoint(r) => r.encode(),
            Self::CanonicalHash(r) => r.encode(),
            Self::InitiatingEvent(r) => r.encode(),
            Self::ExecutingLink(r) => r.encode(),
            Self::ExecutingCheck(r) => r.encode(),
            Self::Padding(r) => r.encode(),
        }
    }
}

impl DecodeEntry for Record {
    /// Dispatch on the type tag
    ///
    /// Reserved tags (6 and above) fail with
    /// [`LogError::UnsupportedEntryType`].
    fn decode(entry: &Entry) -> LogResult<Self> {
        Ok(match EntryType::try_from(entry.tag())? {
            EntryType::SearchCheckpoint => Self::SearchCheckpoint(SearchCheckpoint::decode(entry)?),
            EntryType::CanonicalHash => Self::CanonicalHash(CanonicalHash::decode(entry)?),
            EntryType::InitiatingEvent => Self::InitiatingEvent(InitiatingEvent::decode(entry)?),
            EntryType::ExecutingLink => Self::ExecutingLink(ExecutingLink::decode(entry)?),
            EntryType::ExecutingCheck => Self::ExecutingCheck(ExecutingCheck::decode(entry)?),
            EntryType::Padding => Self::Padding(Padding::decode(entry)?),
        })
    }
}
