//! Test utilities and helpers.

use std::sync::Arc;

use mvto_common::config::EngineConfig;
use mvto_common::error::MvtoResult;
use mvto_common::types::{ItemId, Value};
use mvto_mvcc::Store;
use mvto_txn::{Step, Transaction};

/// Creates a shared store with items `0..items`.
pub fn shared_store(items: usize, gc_threshold: u64) -> MvtoResult<Arc<Store>> {
    Store::with_item_count(items, EngineConfig::default().with_gc_threshold(gc_threshold))
        .map(Arc::new)
}

/// A transaction that reads `item` and writes back the incremented value.
pub fn increment(item: u64) -> Transaction {
    let item = ItemId::new(item);
    Transaction::new(vec![Step::read(item), Step::write(item)])
}

/// `workers` batches, each holding `per_worker` copies of `transaction`.
pub fn uniform_batches(
    workers: usize,
    per_worker: usize,
    transaction: &Transaction,
) -> Vec<Vec<Transaction>> {
    (0..workers)
        .map(|_| vec![transaction.clone(); per_worker])
        .collect()
}

/// Returns the latest value of `item`, if the item exists.
pub fn latest_value(store: &Store, item: u64) -> Option<Value> {
    store
        .item(ItemId::new(item))
        .ok()
        .and_then(|item| item.snapshot().latest_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_batches() {
        let batches = uniform_batches(3, 2, &increment(1));
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 2));
        assert_eq!(batches[0][0].to_string(), "[r1 w1]");
    }

    #[test]
    fn test_latest_value() {
        let store = shared_store(2, 100).unwrap();
        assert_eq!(latest_value(&store, 1), Some(0));
        assert_eq!(latest_value(&store, 5), None);
    }
}
