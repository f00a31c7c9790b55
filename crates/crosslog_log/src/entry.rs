//! Fixed-size entry slots.
//!
//! Every entry is exactly [`ENTRY_SIZE`] bytes. Byte 0 is the type tag,
//! the payload follows, and the rest is right-padded with zeros.
//! All integers are big-endian.

use crate::error::{LogError, LogResult};
use std::fmt;

/// Size of every entry slot in bytes
pub const ENTRY_SIZE: usize = 24;

/// Entries at every multiple of this index are search checkpoints
pub const SEARCH_CHECKPOINT_FREQUENCY: u64 = 256;

/// Index of an entry in the log
pub type EntryIdx = u64;

/// Entry type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EntryType {
    /// Block number, logs since seal, timestamp
    SearchCheckpoint = 0,
    /// Truncated hash of the sealed block
    CanonicalHash = 1,
    /// Event flags and truncated event hash
    InitiatingEvent = 2,
    /// Chain, block number, log index, timestamp of an executed event
    ExecutingLink = 3,
    /// Truncated hash of an executed event
    ExecutingCheck = 4,
    /// Filler before a search checkpoint
    Padding = 5,
}

impl EntryType {
    /// All known entry types, in tag order
    pub const ALL: [EntryType; 6] = [
        Self::SearchCheckpoint,
        Self::CanonicalHash,
        Self::InitiatingEvent,
        Self::ExecutingLink,
        Self::ExecutingCheck,
        Self::Padding,
    ];

    /// The tag byte
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a tag. Tags 6 and above are reserved.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::SearchCheckpoint),
            1 => Some(Self::CanonicalHash),
            2 => Some(Self::InitiatingEvent),
            3 => Some(Self::ExecutingLink),
            4 => Some(Self::ExecutingCheck),
            5 => Some(Self::Padding),
            _ => None,
        }
    }

    /// Name used in diagnostics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchCheckpoint => "searchCheckpoint",
            Self::CanonicalHash => "canonicalHash",
            Self::InitiatingEvent => "initiatingEvent",
            Self::ExecutingLink => "executingLink",
            Self::ExecutingCheck => "executingCheck",
            Self::Padding => "padding",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for EntryType {
    type Error = LogError;

    fn try_from(tag: u8) -> LogResult<Self> {
        Self::from_tag(tag).ok_or(LogError::UnsupportedEntryType { tag })
    }
}

/// One raw entry slot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry([u8; ENTRY_SIZE]);

impl Entry {
    /// Create from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ENTRY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice
    ///
    /// # Errors
    ///
    /// Returns [`LogError::MalformedEntry`] if the slice is not exactly
    /// [`ENTRY_SIZE`] bytes
    pub fn from_slice(data: &[u8]) -> LogResult<Self> {
        let bytes: [u8; ENTRY_SIZE] = data.try_into().map_err(|_| LogError::MalformedEntry {
            reason: format!("entry must be {ENTRY_SIZE} bytes, got {}", data.len()),
        })?;
        Ok(Self(bytes))
    }

    /// Start a zeroed entry with the given type tag
    #[must_use]
    pub(crate) fn with_type(kind: EntryType) -> Self {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0] = kind.tag();
        Self(bytes)
    }

    /// The raw tag byte
    #[must_use]
    pub const fn tag(&self) -> u8 {
        self.0[0]
    }

    /// The entry type, if the tag is known
    #[must_use]
    pub const fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_tag(self.0[0])
    }

    /// Type name for diagnostics, including unknown tags
    #[must_use]
    pub fn type_name(&self) -> String {
        match self.entry_type() {
            Some(kind) => kind.to_string(),
            None => format!("unknown({})", self.tag()),
        }
    }

    /// Get as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ENTRY_SIZE] {
        &self.0
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8; ENTRY_SIZE] {
        &mut self.0
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({}: {})", self.type_name(), self.to_hex())
    }
}

impl AsRef<[u8]> for Entry {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Types that encode into a single entry slot
pub trait EncodeEntry {
    /// The type tag this value encodes with
    fn entry_type(&self) -> EntryType;

    /// Encode into an entry, right-padded with zeros
    fn encode(&self) -> Entry;
}

/// Types that decode from a single entry slot
pub trait DecodeEntry: Sized {
    /// Decode from an entry
    ///
    /// # Errors
    ///
    /// Returns error if the entry has the wrong type tag
    fn decode(entry: &Entry) -> LogResult<Self>;
}

/// Check that an entry carries the expected tag before decoding its payload
pub(crate) fn expect_type(entry: &Entry, kind: EntryType) -> LogResult<()> {
    if entry.tag() == kind.tag() {
        Ok(())
    } else {
        Err(LogError::MalformedEntry {
            reason: format!("expected {} entry, got {}", kind, entry.type_name()),
        })
    }
}
