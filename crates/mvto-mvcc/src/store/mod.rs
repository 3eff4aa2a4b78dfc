//! The process-wide MVTO store.
//!
//! A [`Store`] owns the item map, the timestamp authority, and the shared
//! counters. It is created once, shared by reference (usually through an
//! `Arc`) with every worker, and read back at the end of a run.
//!
//! # Lifecycle
//!
//! ```text
//! Store::create(ids)  ->  issue / read / write / release ...  ->  report()
//! ```
//!
//! The item map is fixed at creation. Items are only ever mutated through
//! their own methods, so the map itself needs no lock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use mvto_common::config::EngineConfig;
use mvto_common::error::{MvtoError, MvtoResult};
use mvto_common::types::{ItemId, Tid};
use tracing::debug;

use crate::gc::{GcResult, GcStats};
use crate::snapshot::ItemSnapshot;
use crate::timestamp::TimestampAuthority;
use crate::version::VersionedItem;

/// Aggregate counters of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of data items.
    pub items: usize,
    /// Timestamps issued, one per transaction attempt.
    pub issued: u64,
    /// Timestamps still in flight.
    pub active: usize,
    /// Aborted attempts.
    pub aborts: u64,
    /// GC sweeps performed.
    pub gc_runs: u64,
    /// Versions removed by GC.
    pub versions_collected: u64,
}

/// End-of-run view of a store.
#[derive(Debug, Clone)]
pub struct StoreReport {
    /// Aggregate counters.
    pub stats: StoreStats,
    /// Every item's surviving versions and readers, ordered by item id.
    pub items: Vec<ItemSnapshot>,
}

impl StoreReport {
    /// Checks every item invariant.
    pub fn verify(&self) -> MvtoResult<()> {
        self.items.iter().try_for_each(ItemSnapshot::verify)
    }
}

/// The versioned item store plus its timestamp authority.
pub struct Store {
    items: BTreeMap<ItemId, VersionedItem>,
    authority: TimestampAuthority,
    aborts: AtomicU64,
    gc_stats: GcStats,
    config: EngineConfig,
}

impl Store {
    /// Creates one item per id, each holding the configured initial value
    /// at version 0. Duplicate ids collapse into one item.
    pub fn create<I>(item_ids: I, config: EngineConfig) -> MvtoResult<Self>
    where
        I: IntoIterator<Item = ItemId>,
    {
        let items: BTreeMap<ItemId, VersionedItem> = item_ids
            .into_iter()
            .map(|id| (id, VersionedItem::new(id, config.initial_value)))
            .collect();

        if items.is_empty() {
            return Err(MvtoError::config("a store needs at least one data item"));
        }

        debug!(items = items.len(), gc_threshold = config.gc_threshold, "store created");

        Ok(Self {
            items,
            authority: TimestampAuthority::new(config.gc_threshold),
            aborts: AtomicU64::new(0),
            gc_stats: GcStats::new(),
            config,
        })
    }

    /// Creates a store with items `0..count`.
    pub fn with_item_count(count: usize, config: EngineConfig) -> MvtoResult<Self> {
        Self::create((0..count as u64).map(ItemId::new), config)
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Looks up an item.
    pub fn item(&self, id: ItemId) -> MvtoResult<&VersionedItem> {
        self.items.get(&id).ok_or(MvtoError::UnknownItem(id))
    }

    /// Iterates over all items in id order.
    pub fn items(&self) -> impl Iterator<Item = &VersionedItem> {
        self.items.values()
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the timestamp authority.
    pub fn authority(&self) -> &TimestampAuthority {
        &self.authority
    }

    /// Issues a timestamp for a new transaction attempt.
    pub fn issue_timestamp(&self) -> Tid {
        self.authority.issue()
    }

    /// Ends the attempt holding `tid`, sweeping every item when the
    /// watermark has advanced far enough.
    pub fn release_timestamp(&self, tid: Tid) -> MvtoResult<Option<GcResult>> {
        // The authority lock is released inside `release`; the sweep below
        // only takes item locks.
        match self.authority.release(tid)? {
            Some(watermark) => {
                let result = self.garbage_collect(watermark);
                debug!(
                    released = %tid,
                    watermark = %watermark,
                    collected = result.versions_collected,
                    "gc sweep"
                );
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Collects every item below `watermark`.
    ///
    /// `watermark` must not exceed the oldest in-flight timestamp.
    pub fn garbage_collect(&self, watermark: Tid) -> GcResult {
        let versions_collected = self
            .items
            .values()
            .map(|item| item.garbage_collect(watermark))
            .sum();
        self.gc_stats.record_run(versions_collected);
        GcResult {
            watermark,
            versions_collected,
            items_swept: self.items.len(),
        }
    }

    /// Counts one aborted attempt.
    pub fn record_abort(&self) {
        self.aborts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Returns the number of aborted attempts so far.
    pub fn abort_count(&self) -> u64 {
        self.aborts.load(AtomicOrdering::Relaxed)
    }

    /// Returns GC statistics.
    pub fn gc_stats(&self) -> &GcStats {
        &self.gc_stats
    }

    /// Returns aggregate counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            items: self.items.len(),
            issued: self.authority.issued_count(),
            active: self.authority.active_count(),
            aborts: self.abort_count(),
            gc_runs: self.gc_stats.total_runs(),
            versions_collected: self.gc_stats.total_versions_collected(),
        }
    }

    /// Captures counters and every item's state.
    pub fn report(&self) -> StoreReport {
        StoreReport {
            stats: self.stats(),
            items: self.items.values().map(VersionedItem::snapshot).collect(),
        }
    }

    /// Checks the invariants of every item.
    pub fn verify(&self) -> MvtoResult<()> {
        self.items
            .values()
            .try_for_each(|item| item.snapshot().verify())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("items", &self.items.len())
            .field("authority", &self.authority)
            .field("aborts", &self.abort_count())
            .field("gc_runs", &self.gc_stats.total_runs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(count: usize, gc_threshold: u64) -> Store {
        Store::with_item_count(count, EngineConfig::default().with_gc_threshold(gc_threshold))
            .unwrap()
    }

    #[test]
    fn test_create_store() {
        let store = Store::create(
            [ItemId::new(3), ItemId::new(1), ItemId::new(3)],
            EngineConfig::default().with_initial_value(7),
        )
        .unwrap();
        assert_eq!(store.item_count(), 2);
        let ids: Vec<u64> = store.items().map(|i| i.id().as_u64()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.item(ItemId::new(1)).unwrap().read(Tid::new(1)).unwrap(), 7);
    }

    #[test]
    fn test_create_empty_store_fails() {
        let err = Store::create(Vec::new(), EngineConfig::default()).unwrap_err();
        assert!(matches!(err, MvtoError::Config(_)));
    }

    #[test]
    fn test_unknown_item() {
        let store = store(2, 100);
        assert!(matches!(
            store.item(ItemId::new(5)),
            Err(MvtoError::UnknownItem(id)) if id == ItemId::new(5)
        ));
    }

    #[test]
    fn test_release_triggers_sweep() {
        let store = store(2, 5);
        let item = store.item(ItemId::new(0)).unwrap();

        let oldest = store.issue_timestamp();
        for value in 0..10 {
            let tid = store.issue_timestamp();
            item.write(tid, value).unwrap();
            assert_eq!(store.release_timestamp(tid).unwrap(), None);
        }
        assert_eq!(item.version_count(), 11);

        let watermark_holder = store.issue_timestamp();
        let result = store.release_timestamp(oldest).unwrap().unwrap();
        assert_eq!(result.watermark, watermark_holder);
        assert_eq!(result.items_swept, 2);
        // Sentinel and latest version survive.
        assert_eq!(result.versions_collected, 9);
        assert_eq!(item.version_count(), 2);
        assert_eq!(store.gc_stats().total_runs(), 1);

        store.release_timestamp(watermark_holder).unwrap();
        let stats = store.stats();
        assert_eq!(stats.issued, 12);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.versions_collected, 9);
    }

    #[test]
    fn test_abort_counter() {
        let store = store(1, 100);
        store.record_abort();
        store.record_abort();
        assert_eq!(store.abort_count(), 2);
        assert_eq!(store.stats().aborts, 2);
    }

    #[test]
    fn test_report_and_verify() {
        let store = store(3, 100);
        let tid = store.issue_timestamp();
        store.item(ItemId::new(2)).unwrap().write(tid, 11).unwrap();
        store.release_timestamp(tid).unwrap();

        let report = store.report();
        assert_eq!(report.items.len(), 3);
        assert_eq!(report.items[2].latest_value(), Some(11));
        assert!(report.verify().is_ok());
        assert!(store.verify().is_ok());
    }
}
