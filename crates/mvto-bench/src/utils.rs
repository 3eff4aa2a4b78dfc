//! Benchmark utilities and helpers.

use mvto_common::config::WorkloadConfig;
use mvto_common::types::{ItemId, Tid};
use mvto_mvcc::VersionedItem;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Builds an item holding versions `1..=versions` on top of the sentinel.
pub fn populated_item(versions: u64) -> VersionedItem {
    let item = VersionedItem::new(ItemId::new(0), 0);
    for v in 1..=versions {
        // Fresh item with increasing versions and no readers: never rejected.
        let _ = item.write(Tid::new(v), v as i64);
    }
    item
}

/// Generates random timestamps in `1..=max`.
pub fn random_tids(count: usize, max: u64) -> Vec<Tid> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count).map(|_| Tid::new(rng.gen_range(1..=max))).collect()
}

/// Builds a workload configuration for the throughput benchmarks.
pub fn workload(threads: usize, transactions: usize) -> WorkloadConfig {
    WorkloadConfig {
        threads,
        items: 5,
        transactions,
        steps_per_txn: 10,
        read_probability: 0.5,
        seed: 42,
    }
}
