//! Garbage collection bookkeeping.
//!
//! Sweeps themselves are driven by the store when the timestamp authority
//! reports that the watermark has advanced past the GC threshold. This
//! module holds the per-sweep result and the running statistics.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use mvto_common::types::Tid;

/// Statistics about garbage collection.
#[derive(Debug, Default)]
pub struct GcStats {
    /// Total number of sweeps.
    pub runs: AtomicU64,
    /// Total versions collected.
    pub versions_collected: AtomicU64,
}

impl GcStats {
    /// Creates new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sweep.
    pub fn record_run(&self, versions: usize) {
        self.runs.fetch_add(1, AtomicOrdering::Relaxed);
        self.versions_collected
            .fetch_add(versions as u64, AtomicOrdering::Relaxed);
    }

    /// Returns the total number of sweeps.
    pub fn total_runs(&self) -> u64 {
        self.runs.load(AtomicOrdering::Relaxed)
    }

    /// Returns the total versions collected.
    pub fn total_versions_collected(&self) -> u64 {
        self.versions_collected.load(AtomicOrdering::Relaxed)
    }
}

/// Result of one sweep over the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcResult {
    /// The watermark the sweep collected below.
    pub watermark: Tid,
    /// Number of versions removed across all items.
    pub versions_collected: usize,
    /// Number of items visited.
    pub items_swept: usize,
}

impl GcResult {
    /// Returns true if any version was removed.
    pub fn did_work(&self) -> bool {
        self.versions_collected > 0
    }
}
