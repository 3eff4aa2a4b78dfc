//! Versioned data items and the MVTO admission rules.
//!
//! Every data item keeps all of its live versions keyed by the timestamp of
//! the transaction that wrote them, plus a reader map that remembers, per
//! version, the largest timestamp that read it.
//!
//! # Read rule
//!
//! A reader with timestamp `t` sees the newest version `v <= t`. When the
//! reader is not adjacent to that version (`t > v + 1`), `t` is recorded as a
//! reader of `v`, since some future writer could land between `v` and `t`.
//!
//! # Write rule
//!
//! A writer with timestamp `w` is rejected when a recorded pair `(v, r)`
//! satisfies `v < w < r`: reader `r` already observed `v` and would have had
//! to observe `w` instead.
//!
//! ```text
//!   v ────────── w ────────── r
//!   read by r    write by w   reader
//!                 └── rejected: r should have seen w
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use mvto_common::error::{MvtoError, MvtoResult, OrderViolation};
use mvto_common::types::{ItemId, Tid, Value};
use parking_lot::Mutex;
use tracing::trace;

use crate::snapshot::ItemSnapshot;

/// Mutable state of one item, guarded by the item lock.
#[derive(Debug)]
struct ItemState {
    /// Version timestamp -> value. Always contains `Tid::ZERO`.
    values: BTreeMap<Tid, Value>,
    /// Version timestamp -> largest non-adjacent reader of that version.
    max_readers: BTreeMap<Tid, Tid>,
}

impl ItemState {
    /// Records `reader` as having read `version` unless it is adjacent.
    fn record_reader(&mut self, version: Tid, reader: Tid) {
        if reader <= version.next() {
            return;
        }
        self.max_readers
            .entry(version)
            .and_modify(|recorded| {
                if *recorded < reader {
                    *recorded = reader;
                }
            })
            .or_insert(reader);
    }
}

/// One data item holding every live version of its value.
pub struct VersionedItem {
    /// Item identifier.
    id: ItemId,
    /// Highest version ever written. Only advanced, under the item lock.
    max_version: AtomicU64,
    /// Versions and reader timestamps.
    state: Mutex<ItemState>,
}

impl VersionedItem {
    /// Creates an item whose sentinel version 0 holds `initial_value`.
    pub fn new(id: ItemId, initial_value: Value) -> Self {
        let mut values = BTreeMap::new();
        values.insert(Tid::ZERO, initial_value);
        Self {
            id,
            max_version: AtomicU64::new(Tid::ZERO.as_u64()),
            state: Mutex::new(ItemState {
                values,
                max_readers: BTreeMap::new(),
            }),
        }
    }

    /// Returns the item identifier.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the highest version written so far.
    pub fn max_version(&self) -> Tid {
        Tid::new(self.max_version.load(AtomicOrdering::Acquire))
    }

    /// Returns the number of stored versions, including the sentinel.
    pub fn version_count(&self) -> usize {
        self.state.lock().values.len()
    }

    /// Reads the value visible to a transaction with timestamp `tid`.
    ///
    /// Fails with [`MvtoError::ConsistencyFault`] when no version `<= tid`
    /// has a stored value, which the sentinel version makes impossible
    /// unless an invariant is broken.
    pub fn read(&self, tid: Tid) -> MvtoResult<Value> {
        let mut state = self.state.lock();
        let max_version = self.max_version();

        let version = if tid >= max_version {
            max_version
        } else {
            match state.values.range(..=tid).next_back() {
                Some((&version, _)) => version,
                None => {
                    return Err(MvtoError::consistency_fault(
                        self.id,
                        tid,
                        format!("no version <= {} (max version {})", tid, max_version),
                    ))
                }
            }
        };

        let value = match state.values.get(&version) {
            Some(&value) => value,
            None => {
                return Err(MvtoError::consistency_fault(
                    self.id,
                    tid,
                    format!("version {} has no stored value", version),
                ))
            }
        };

        state.record_reader(version, tid);
        trace!(item = %self.id, %tid, %version, value, "read");
        Ok(value)
    }

    /// Installs `value` as the version written by timestamp `version`.
    ///
    /// The check against recorded readers and the mutation happen in one
    /// critical section. On rejection nothing is modified.
    pub fn write(&self, version: Tid, value: Value) -> Result<(), OrderViolation> {
        let mut state = self.state.lock();

        // Readers are keyed by the version they read, so only versions
        // older than the writer can produce a violation.
        let violation = state
            .max_readers
            .range(..version)
            .find(|(_, reader)| version < **reader)
            .map(|(&read_version, &reader)| OrderViolation {
                item: self.id,
                writer: version,
                read_version,
                reader,
            });

        if let Some(violation) = violation {
            trace!(item = %self.id, writer = %version, read_version = %violation.read_version,
                reader = %violation.reader, "write rejected");
            return Err(violation);
        }

        state.values.insert(version, value);
        self.max_version
            .fetch_max(version.as_u64(), AtomicOrdering::AcqRel);
        trace!(item = %self.id, %version, value, "write");
        Ok(())
    }

    /// Discards versions no active or future reader can select.
    ///
    /// `threshold` is the oldest in-flight timestamp. Every reader from now
    /// on has a timestamp `>= threshold`, so it selects either the newest
    /// version `<= threshold` or something newer. Versions older than that
    /// one are removed along with their reader entries. The sentinel and
    /// the latest version are never removed.
    ///
    /// Returns the number of versions removed.
    pub fn garbage_collect(&self, threshold: Tid) -> usize {
        let mut state = self.state.lock();
        let max_version = self.max_version();

        let floor = match state.values.range(..=threshold).next_back() {
            Some((&floor, _)) if floor > Tid::FIRST => floor,
            _ => return 0,
        };

        let doomed: Vec<Tid> = state
            .values
            .range(Tid::FIRST..floor)
            .map(|(&version, _)| version)
            .filter(|&version| version < threshold && version < max_version)
            .collect();

        for version in &doomed {
            state.values.remove(version);
            state.max_readers.remove(version);
        }

        if !doomed.is_empty() {
            trace!(item = %self.id, %threshold, removed = doomed.len(), "gc");
        }
        doomed.len()
    }

    /// Captures the item's versions and reader map for diagnostics.
    pub fn snapshot(&self) -> ItemSnapshot {
        let state = self.state.lock();
        ItemSnapshot {
            id: self.id,
            max_version: self.max_version(),
            versions: state.values.clone(),
            max_readers: state.max_readers.clone(),
        }
    }
}

impl fmt::Debug for VersionedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedItem")
            .field("id", &self.id)
            .field("max_version", &self.max_version())
            .field("versions", &self.version_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> VersionedItem {
        VersionedItem::new(ItemId::new(0), 0)
    }

    fn t(tid: u64) -> Tid {
        Tid::new(tid)
    }

    #[test]
    fn test_new_item_has_sentinel() {
        let item = VersionedItem::new(ItemId::new(4), 17);
        assert_eq!(item.id(), ItemId::new(4));
        assert_eq!(item.max_version(), Tid::ZERO);
        assert_eq!(item.version_count(), 1);
        assert_eq!(item.read(t(1)).unwrap(), 17);
    }

    #[test]
    fn test_write_then_read_same_tid() {
        let item = item();
        item.write(t(5), 42).unwrap();
        assert_eq!(item.read(t(5)).unwrap(), 42);
        assert_eq!(item.max_version(), t(5));
    }

    #[test]
    fn test_read_selects_newest_older_version() {
        let item = item();
        item.write(t(3), 30).unwrap();
        item.write(t(7), 70).unwrap();
        item.write(t(12), 120).unwrap();

        assert_eq!(item.read(t(2)).unwrap(), 0);
        assert_eq!(item.read(t(3)).unwrap(), 30);
        assert_eq!(item.read(t(9)).unwrap(), 70);
        assert_eq!(item.read(t(20)).unwrap(), 120);
    }

    #[test]
    fn test_adjacent_reader_not_recorded() {
        let item = item();
        item.write(t(4), 1).unwrap();
        item.read(t(5)).unwrap();
        assert!(item.snapshot().max_readers.is_empty());

        item.read(t(6)).unwrap();
        assert_eq!(item.snapshot().max_readers.get(&t(4)), Some(&t(6)));
    }

    #[test]
    fn test_reader_map_keeps_maximum() {
        let item = item();
        item.read(t(9)).unwrap();
        item.read(t(4)).unwrap();
        assert_eq!(item.snapshot().max_readers.get(&Tid::ZERO), Some(&t(9)));
    }

    #[test]
    fn test_write_rejected_behind_later_reader() {
        let item = item();
        // t8 reads the sentinel, so a write at 5 would invalidate that read.
        assert_eq!(item.read(t(8)).unwrap(), 0);

        let before = item.snapshot();
        let violation = item.write(t(5), 99).unwrap_err();
        assert_eq!(violation.item, ItemId::new(0));
        assert_eq!(violation.writer, t(5));
        assert_eq!(violation.read_version, Tid::ZERO);
        assert_eq!(violation.reader, t(8));

        // Rejection leaves the item untouched.
        assert_eq!(item.snapshot(), before);
    }

    #[test]
    fn test_write_after_reader_is_admitted() {
        let item = item();
        item.read(t(8)).unwrap();
        item.write(t(8), 1).unwrap();
        item.write(t(9), 2).unwrap();
        assert_eq!(item.max_version(), t(9));
    }

    #[test]
    fn test_older_read_is_recorded() {
        let item = item();
        item.write(t(10), 100).unwrap();
        // t6 reads the sentinel through the historical path.
        assert_eq!(item.read(t(6)).unwrap(), 0);
        assert!(item.write(t(3), 3).is_err());
        assert!(item.write(t(7), 7).is_ok());
    }

    #[test]
    fn test_same_version_overwrites() {
        let item = item();
        item.write(t(3), 1).unwrap();
        item.write(t(3), 2).unwrap();
        assert_eq!(item.read(t(3)).unwrap(), 2);
        assert_eq!(item.version_count(), 2);
    }

    #[test]
    fn test_max_version_never_decreases() {
        let item = item();
        item.write(t(10), 1).unwrap();
        item.write(t(4), 2).unwrap();
        assert_eq!(item.max_version(), t(10));
        assert_eq!(item.read(t(5)).unwrap(), 2);
    }

    #[test]
    fn test_gc_keeps_sentinel_latest_and_watermark_version() {
        let item = item();
        for v in [2, 5, 9, 30] {
            item.write(t(v), v as i64).unwrap();
        }

        // Oldest active is 20: it still needs version 9.
        let removed = item.garbage_collect(t(20));
        assert_eq!(removed, 2);

        let snapshot = item.snapshot();
        let keys: Vec<u64> = snapshot.versions.keys().map(|v| v.as_u64()).collect();
        assert_eq!(keys, vec![0, 9, 30]);
        assert_eq!(item.read(t(20)).unwrap(), 9);
    }

    #[test]
    fn test_gc_never_removes_latest() {
        let item = item();
        item.write(t(3), 3).unwrap();
        item.write(t(6), 6).unwrap();

        item.garbage_collect(t(500));
        let keys: Vec<u64> = item.snapshot().versions.keys().map(|v| v.as_u64()).collect();
        assert_eq!(keys, vec![0, 6]);
        assert_eq!(item.max_version(), t(6));
    }

    #[test]
    fn test_gc_drops_reader_entries() {
        let item = item();
        item.write(t(2), 2).unwrap();
        item.read(t(5)).unwrap();
        item.write(t(5), 5).unwrap();
        item.write(t(9), 9).unwrap();
        assert!(item.snapshot().max_readers.contains_key(&t(2)));

        item.garbage_collect(t(10));
        let snapshot = item.snapshot();
        assert!(!snapshot.versions.contains_key(&t(2)));
        assert!(!snapshot.max_readers.contains_key(&t(2)));
    }

    #[test]
    fn test_gc_below_first_version_is_noop() {
        let item = item();
        item.write(t(50), 1).unwrap();
        assert_eq!(item.garbage_collect(t(10)), 0);
        assert_eq!(item.version_count(), 2);
    }
}
