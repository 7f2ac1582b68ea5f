//! `ElementId`: a strong, zero-cost handle for network elements.
//!
//! Every element in a [`Network`](crate::network::Network) arena — edge,
//! lane, additional, shape, TAZ, demand element or data element — is referred
//! to by a unique opaque identifier. `ElementId` wraps a nonzero `u64` so
//! that 0 stays reserved as an invalid/sentinel value and so the niche makes
//! `Option<ElementId>` cost nothing.
//!
//! Relationship sequences store these handles rather than owning elements;
//! the arena is the single owner.

use std::{fmt, num::NonZeroU64};

/// Opaque, copyable handle to one element in an arena.
///
/// # Memory layout
/// `repr(transparent)`: same ABI and alignment as `NonZeroU64`, so a
/// sequence of ids is layout-compatible with a sequence of `u64`s.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ElementId(NonZeroU64);

impl ElementId {
    /// Creates an `ElementId` from a raw `u64`.
    ///
    /// Arena allocation starts at 1 and never reuses a value, so in normal
    /// use this is only needed when reconstructing ids from serialized data.
    ///
    /// # Panics
    ///
    /// Panics if `raw == 0`; zero is reserved as the invalid sentinel.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use net_ledger::element::id::ElementId;
    /// let e = ElementId::new(1);
    /// assert_eq!(e.get(), 1);
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Self {
        ElementId(NonZeroU64::new(raw).expect("ElementId must be non-zero"))
    }

    /// Returns the raw `u64` behind this handle.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

/// Debug prints as `ElementId(raw)`.
impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementId").field(&self.get()).finish()
    }
}

/// Display prints only the raw integer.
impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// -----------------------------------------------------------------------------
// Testing and assertions
// -----------------------------------------------------------------------------
