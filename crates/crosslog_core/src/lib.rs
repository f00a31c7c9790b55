//! crosslog core types
//!
//! Hashes, block and chain identifiers, and executing messages.
//! Pure types with no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod id;
pub mod message;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use hash::{Hash, TruncatedHash};
pub use id::{BlockId, ChainId};
pub use message::ExecutingMessage;
