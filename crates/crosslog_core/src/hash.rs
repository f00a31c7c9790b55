//! Block and event hashes.
//!
//! Full hashes are 32 bytes. The entry log only ever stores the first
//! 20 bytes, which is enough to match identifiers and payloads.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A full 32-byte hash (block hash, payload hash)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The number of bytes in a hash
    pub const LEN: usize = 32;

    /// Compute the BLAKE3 hash of data
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// The all-zero hash
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Create from bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether every byte is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Keep the first 20 bytes
    #[must_use]
    pub fn truncate(&self) -> TruncatedHash {
        let mut out = [0u8; TruncatedHash::LEN];
        out.copy_from_slice(&self.0[..TruncatedHash::LEN]);
        TruncatedHash(out)
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without `0x` prefix
    ///
    /// # Errors
    ///
    /// Returns error if hex is invalid or not 32 bytes
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        Ok(Self(parse_hex_array(s)?))
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// The first 20 bytes of a [`Hash`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TruncatedHash([u8; 20]);

impl TruncatedHash {
    /// The number of bytes in a truncated hash
    pub const LEN: usize = 20;

    /// The all-zero truncated hash
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Create from bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check whether every byte is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without `0x` prefix
    ///
    /// # Errors
    ///
    /// Returns error if hex is invalid or not 20 bytes
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        Ok(Self(parse_hex_array(s)?))
    }
}

impl fmt::Display for TruncatedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for TruncatedHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for TruncatedHash {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for TruncatedHash {
    fn from(hash: Hash) -> Self {
        hash.truncate()
    }
}

fn parse_hex_array<const N: usize>(s: &str) -> CoreResult<[u8; N]> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|_| CoreError::InvalidHex)?;
    if bytes.len() != N {
        return Err(CoreError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_compute() {
        let hash = Hash::compute(b"hello world");
        assert_eq!(hash.to_hex().len(), 64);
        assert!(!hash.is_zero());
    }

    #[test]
    fn test_hash_from_to_hex() {
        let hash = Hash::compute(b"test");
        let restored = Hash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, restored);

        let prefixed = Hash::from_hex(&hash.to_string()).unwrap();
        assert_eq!(hash, prefixed);
    }

    #[test]
    fn test_hash_from_hex_wrong_length() {
        let err = Hash::from_hex("abcd").unwrap_err();
        assert_eq!(err, CoreError::InvalidLength { expected: 32, actual: 2 });
        assert_eq!(Hash::from_hex("zz").unwrap_err(), CoreError::InvalidHex);
    }

    #[test]
    fn test_truncate_keeps_prefix() {
        let hash = Hash::compute(b"block");
        let short = hash.truncate();
        assert_eq!(short.as_bytes(), &hash.as_bytes()[..20]);
        assert_eq!(TruncatedHash::from(hash), short);
    }

    #[test]
    fn test_truncated_display() {
        let short = TruncatedHash::from_bytes([0xab; 20]);
        assert_eq!(short.to_string(), format!("0x{}", "ab".repeat(20)));
        assert_eq!(TruncatedHash::from_hex(&short.to_string()).unwrap(), short);
    }

    #[test]
    fn test_zero() {
        assert!(Hash::zero().is_zero());
        assert!(TruncatedHash::zero().is_zero());
        assert_eq!(Hash::default(), Hash::zero());
        assert_eq!(Hash::zero().truncate(), TruncatedHash::zero());
    }
}
