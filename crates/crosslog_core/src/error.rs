//! Core error types for crosslog.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Invalid hex encoding
    #[error("Invalid hex encoding")]
    InvalidHex,

    /// Byte string of the wrong length
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Malformed block identifier
    #[error("Invalid block id: {reason}")]
    InvalidBlockId {
        /// What was wrong with it
        reason: String,
    },
}
