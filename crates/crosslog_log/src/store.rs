//! Entry storage.
//!
//! The cursor never touches storage on its own. Entries it synthesizes sit
//! in the output buffer until [`LogContext::flush_into`] hands them to an
//! [`EntryStore`] in one batch; a cursor over stored entries is rebuilt with
//! [`LogContext::replay`].

use crate::entry::{ENTRY_SIZE, Entry, EntryIdx};
use crate::error::{LogError, LogResult};
use crate::state::LogContext;
use tracing::debug;

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Read past the end of the store
    #[error("Entry index {idx} out of range, store holds {size} entries")]
    OutOfRange {
        /// Requested index
        idx: EntryIdx,
        /// Number of stored entries
        size: EntryIdx,
    },

    /// Batch does not start where the store ends
    #[error("Store misaligned: buffered entries start at {expected}, store ends at {actual}")]
    Misaligned {
        /// Index the buffered entries start at
        expected: EntryIdx,
        /// Number of stored entries
        actual: EntryIdx,
    },
}

/// Append-only entry storage
pub trait EntryStore {
    /// Number of stored entries
    fn size(&self) -> EntryIdx;

    /// Read the entry at `idx`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfRange`] if `idx` is not below
    /// [`EntryStore::size`]
    fn read(&self, idx: EntryIdx) -> StoreResult<Entry>;

    /// Append a batch of entries, all or nothing
    ///
    /// Returns the index of the first appended entry.
    ///
    /// # Errors
    ///
    /// Returns error if the batch could not be stored; nothing is stored then
    fn append(&mut self, entries: &[Entry]) -> StoreResult<EntryIdx>;
}

/// In-memory entry store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemEntryStore {
    entries: Vec<Entry>,
}

impl MemEntryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a raw byte image of consecutive entry slots
    ///
    /// # Errors
    ///
    /// Returns [`LogError::MalformedEntry`] if the image length is not a
    /// multiple of [`ENTRY_SIZE`]
    pub fn from_bytes(data: &[u8]) -> LogResult<Self> {
        if data.len() % ENTRY_SIZE != 0 {
            return Err(LogError::MalformedEntry {
                reason: format!(
                    "log image of {} bytes has a trailing partial entry of {} bytes",
                    data.len(),
                    data.len() % ENTRY_SIZE
                ),
            });
        }
        let entries = data
            .chunks_exact(ENTRY_SIZE)
            .map(Entry::from_slice)
            .collect::<LogResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Raw byte image of all stored entries
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries
            .iter()
            .flat_map(|e| e.as_bytes().iter().copied())
            .collect()
    }

    /// All stored entries
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl EntryStore for MemEntryStore {
    fn size(&self) -> EntryIdx {
        self.entries.len() as EntryIdx
    }

    fn read(&self, idx: EntryIdx) -> StoreResult<Entry> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.entries.get(i))
            .copied()
            .ok_or(StoreError::OutOfRange {
                idx,
                size: self.size(),
            })
    }

    fn append(&mut self, entries: &[Entry]) -> StoreResult<EntryIdx> {
        let first = self.size();
        self.entries.extend_from_slice(entries);
        Ok(first)
    }
}

impl LogContext {
    /// Take all buffered entries, leaving the buffer empty
    pub fn take_pending(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.out)
    }

    /// Append all buffered entries to `store` as one batch
    ///
    /// Returns the number of entries written. The buffer is only cleared
    /// once the store accepted the batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Misaligned`] if the store does not end where
    /// the buffer begins, or the store's own error if the append fails
    pub fn flush_into(&mut self, store: &mut impl EntryStore) -> LogResult<usize> {
        let expected = self.next_index - self.out.len() as EntryIdx;
        let actual = store.size();
        if actual != expected {
            return Err(StoreError::Misaligned { expected, actual }.into());
        }
        if self.out.is_empty() {
            return Ok(0);
        }
        let first = store.append(&self.out)?;
        let written = self.out.len();
        debug!(first, written, "flushed entries");
        self.out.clear();
        Ok(written)
    }

    /// Rebuild a cursor from every entry in `store`
    ///
    /// # Errors
    ///
    /// Returns the first entry that fails to apply, wrapped with its index,
    /// or a store read error
    pub fn replay(store: &impl EntryStore) -> LogResult<Self> {
        let mut ctx = Self::new();
        for idx in 0..store.size() {
            let entry = store.read(idx)?;
            ctx.apply_entry(&entry)?;
        }
        debug!(entries = ctx.next_index, need = %ctx.need, "replayed log");
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EncodeEntry, EntryType};
    use crate::record::{Padding, SearchCheckpoint};
    use crosslog_core::{BlockId, ChainId, ExecutingMessage, Hash};

    fn block(n: u64) -> BlockId {
        BlockId::new(Hash::compute(&n.to_be_bytes()), n)
    }

    /// Write a few blocks with logs, some executing
    fn written() -> LogContext {
        let mut ctx = LogContext::new();
        ctx.force_block(block(0), 10).unwrap();
        for n in 1..=40u64 {
            ctx.seal_block(block(n - 1).hash, block(n), 10 + n).unwrap();
            for i in 0..(n as u32 % 9) {
                let hash = Hash::compute(format!("{n}/{i}").as_bytes()).truncate();
                let exec = (i % 3 == 1).then(|| {
                    ExecutingMessage::new(ChainId::new(7), n, i, 10 + n, hash)
                });
                ctx.apply_log(block(n), i, hash, exec).unwrap();
            }
        }
        ctx
    }

    #[test]
    fn test_mem_store_read_append() {
        let mut store = MemEntryStore::new();
        let a = SearchCheckpoint::new(1, 0, 1).encode();
        let b = Padding.encode();
        assert_eq!(store.append(&[a]).unwrap(), 0);
        assert_eq!(store.append(&[b, b]).unwrap(), 1);
        assert_eq!(store.size(), 3);
        assert_eq!(store.read(0).unwrap(), a);
        assert_eq!(store.read(2).unwrap(), b);
        assert_eq!(
            store.read(3).unwrap_err(),
            StoreError::OutOfRange { idx: 3, size: 3 }
        );
    }

    #[test]
    fn test_bytes_image() {
        let mut store = MemEntryStore::new();
        store.append(&[Padding.encode(), SearchCheckpoint::new(9, 1, 2).encode()]).unwrap();
        let bytes = store.to_bytes();
        assert_eq!(bytes.len(), 2 * ENTRY_SIZE);
        assert_eq!(MemEntryStore::from_bytes(&bytes).unwrap(), store);

        let err = MemEntryStore::from_bytes(&bytes[..ENTRY_SIZE + 5]).unwrap_err();
        assert!(matches!(err, LogError::MalformedEntry { .. }));
        assert!(MemEntryStore::from_bytes(&[]).unwrap().entries().is_empty());
    }

    #[test]
    fn test_take_pending() {
        let mut ctx = written();
        let next = ctx.next_index();
        let taken = ctx.take_pending();
        assert_eq!(taken.len() as EntryIdx, next);
        assert!(ctx.pending().is_empty());
        assert_eq!(ctx.next_index(), next);
    }

    #[test]
    fn test_flush_and_replay_match() {
        let mut ctx = written();
        let mut store = MemEntryStore::new();
        let written = ctx.flush_into(&mut store).unwrap();
        assert_eq!(written as EntryIdx, store.size());
        assert!(ctx.pending().is_empty());

        let replayed = LogContext::replay(&store).unwrap();
        assert_eq!(replayed, ctx);
        assert_eq!(replayed.sealed_block(), ctx.sealed_block());
        assert_eq!(replayed.init_message(), ctx.init_message());
    }

    #[test]
    fn test_replayed_cursor_keeps_writing() {
        let mut ctx = written();
        let mut store = MemEntryStore::new();
        ctx.flush_into(&mut store).unwrap();

        let mut resumed = LogContext::replay(&store).unwrap();
        resumed.seal_block(block(40).hash, block(41), 60).unwrap();
        ctx.seal_block(block(40).hash, block(41), 60).unwrap();
        assert_eq!(resumed.pending(), ctx.pending());
        assert_eq!(resumed.flush_into(&mut store).unwrap(), 2);
        assert_eq!(LogContext::replay(&store).unwrap(), resumed);
    }

    #[test]
    fn test_flush_misaligned() {
        let mut ctx = written();
        let mut store = MemEntryStore::new();
        store.append(&[Padding.encode()]).unwrap();
        let pending = ctx.pending().len();
        let err = ctx.flush_into(&mut store).unwrap_err();
        assert_eq!(
            err,
            LogError::Store(StoreError::Misaligned {
                expected: 0,
                actual: 1
            })
        );
        assert_eq!(ctx.pending().len(), pending);
    }

    #[test]
    fn test_flush_empty_buffer() {
        let mut ctx = LogContext::new();
        let mut store = MemEntryStore::new();
        assert_eq!(ctx.flush_into(&mut store).unwrap(), 0);
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_replay_reports_bad_entry() {
        let mut store = MemEntryStore::new();
        bootstrapped(&mut store);
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0] = EntryType::ExecutingCheck.tag();
        store.append(&[Entry::from_bytes(bytes)]).unwrap();

        let err = LogContext::replay(&store).unwrap_err();
        match err {
            LogError::Entry { index, entry_type, .. } => {
                assert_eq!(index, 2);
                assert_eq!(entry_type, "executingCheck");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn bootstrapped(store: &mut MemEntryStore) {
        let mut ctx = LogContext::new();
        ctx.force_block(block(3), 3).unwrap();
        ctx.flush_into(store).unwrap();
    }
}
