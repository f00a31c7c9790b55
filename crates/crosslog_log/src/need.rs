//! Outstanding obligations of the log cursor.
//!
//! Each [`Need`] names an entry that must still be read or written before
//! the cursor is at a consistent point.

use std::fmt;

/// A pending requirement for the next entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Need {
    /// A search checkpoint entry
    SearchCheckpoint,
    /// A canonical hash entry, always right after a checkpoint
    CanonicalHash,
    /// The initiating event of the current log
    InitiatingEvent,
    /// The executing link of the current log
    ExecutingLink,
    /// The executing check of the current log
    ExecutingCheck,
    /// First padding slot
    Padding,
    /// Second padding slot, cleared after the first
    Padding2,
}

impl Need {
    /// All obligations
    pub const ALL: [Need; 7] = [
        Self::SearchCheckpoint,
        Self::CanonicalHash,
        Self::InitiatingEvent,
        Self::ExecutingLink,
        Self::ExecutingCheck,
        Self::Padding,
        Self::Padding2,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
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
            Self::Padding2 => "padding2",
        }
    }
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`Need`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NeedSet(u8);

impl NeedSet {
    /// The empty set
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add an obligation
    pub fn add(&mut self, need: Need) {
        self.0 |= need.bit();
    }

    /// Remove an obligation
    pub fn remove(&mut self, need: Need) {
        self.0 &= !need.bit();
    }

    /// Check for one obligation
    #[must_use]
    pub const fn contains(&self, need: Need) -> bool {
        self.0 & need.bit() != 0
    }

    /// Check whether any of the given obligations is outstanding
    #[must_use]
    pub fn any(&self, needs: &[Need]) -> bool {
        needs.iter().any(|n| self.contains(*n))
    }

    /// Check for no outstanding obligations
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Drop every obligation
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Iterate over outstanding obligations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Need> + '_ {
        Need::ALL.into_iter().filter(|n| self.contains(*n))
    }
}

impl FromIterator<Need> for NeedSet {
    fn from_iter<I: IntoIterator<Item = Need>>(iter: I) -> Self {
        let mut set = Self::new();
        for need in iter {
            set.add(need);
        }
        set
    }
}

impl fmt::Display for NeedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, need) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{need}")?;
        }
        f.write_str("}")
    }
}
