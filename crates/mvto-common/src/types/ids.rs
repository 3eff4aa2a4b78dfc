//! Core identifier types.
//!
//! Type-safe wrappers around numeric identifiers so that a transaction
//! timestamp can never be passed where a data item id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction timestamp.
///
/// A `Tid` is both the identity of one transaction attempt and its logical
/// position in the serialization order. Tids are issued strictly increasing
/// by the timestamp authority; a retried transaction receives a fresh one.
/// The version a transaction writes is keyed by its tid.
///
/// # Example
///
/// ```rust
/// use mvto_common::types::Tid;
///
/// let tid = Tid::new(10);
/// assert!(tid > Tid::ZERO);
/// assert_eq!(tid.next().as_u64(), 11);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Tid(u64);

impl Tid {
    /// Timestamp of the sentinel version every item starts with. Never issued.
    pub const ZERO: Self = Self(0);

    /// First timestamp handed out by the authority.
    pub const FIRST: Self = Self(1);

    /// Creates a new `Tid` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(tid: u64) -> Self {
        Self(tid)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the immediately following timestamp.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns true for the sentinel timestamp.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `self - earlier`, saturating at zero.
    #[inline]
    #[must_use]
    pub const fn distance_from(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tid({})", self.0)
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Tid {
    #[inline]
    fn from(tid: u64) -> Self {
        Self::new(tid)
    }
}

impl From<Tid> for u64 {
    #[inline]
    fn from(tid: Tid) -> Self {
        tid.0
    }
}

/// Data item identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Creates a new `ItemId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<u64> for ItemId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ItemId> for u64 {
    #[inline]
    fn from(id: ItemId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tid() {
        let tid = Tid::new(100);
        assert_eq!(tid.as_u64(), 100);
        assert!(!tid.is_zero());
        assert!(Tid::ZERO.is_zero());
        assert_eq!(tid.next().as_u64(), 101);
        assert_eq!(Tid::new(u64::MAX).next().as_u64(), u64::MAX);
    }

    #[test]
    fn test_tid_distance() {
        assert_eq!(Tid::new(250).distance_from(Tid::new(150)), 100);
        assert_eq!(Tid::new(5).distance_from(Tid::new(9)), 0);
    }

    #[test]
    fn test_tid_ordering() {
        assert!(Tid::ZERO < Tid::FIRST);
        assert!(Tid::new(3) < Tid::new(4));
        let raw: u64 = Tid::new(9).into();
        assert_eq!(raw, 9);
        assert_eq!(Tid::from(9), Tid::new(9));
    }

    #[test]
    fn test_item_id_display() {
        let item = ItemId::new(3);
        assert_eq!(format!("{}", item), "x3");
        assert_eq!(format!("{:?}", item), "ItemId(3)");
        assert_eq!(format!("{:?}", Tid::new(7)), "Tid(7)");
    }
}
