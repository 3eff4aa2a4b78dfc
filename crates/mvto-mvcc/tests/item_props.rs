//! Property tests for the item read, write, and GC rules.

use std::collections::BTreeMap;

use mvto_common::types::{ItemId, Tid, Value};
use mvto_mvcc::VersionedItem;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Read(u64),
    Write(u64, Value),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..200).prop_map(Op::Read),
        (1u64..200, -1_000i64..1_000).prop_map(|(t, v)| Op::Write(t, v)),
    ]
}

/// Applies `ops`, mirroring admitted writes into a plain map.
fn apply(item: &VersionedItem, ops: &[Op]) -> BTreeMap<Tid, Value> {
    let mut model = BTreeMap::new();
    model.insert(Tid::ZERO, 0);
    for op in ops {
        match *op {
            Op::Read(t) => {
                item.read(Tid::new(t)).unwrap();
            }
            Op::Write(t, v) => {
                if item.write(Tid::new(t), v).is_ok() {
                    model.insert(Tid::new(t), v);
                }
            }
        }
    }
    model
}

fn visible(model: &BTreeMap<Tid, Value>, t: u64) -> Value {
    model
        .range(..=Tid::new(t))
        .next_back()
        .map(|(_, &v)| v)
        .unwrap_or_default()
}

proptest! {
    #[test]
    fn max_version_tracks_largest_key(ops in proptest::collection::vec(op(), 0..64)) {
        let item = VersionedItem::new(ItemId::new(0), 0);
        let model = apply(&item, &ops);

        let snapshot = item.snapshot();
        prop_assert!(snapshot.verify().is_ok());
        prop_assert_eq!(snapshot.versions, model.clone());
        prop_assert_eq!(Some(&item.max_version()), model.keys().next_back());
    }

    #[test]
    fn reads_see_newest_older_version(
        ops in proptest::collection::vec(op(), 0..64),
        probe in 1u64..250,
    ) {
        let item = VersionedItem::new(ItemId::new(0), 0);
        let model = apply(&item, &ops);
        prop_assert_eq!(item.read(Tid::new(probe)).unwrap(), visible(&model, probe));
    }

    #[test]
    fn rejected_write_changes_nothing(
        ops in proptest::collection::vec(op(), 0..64),
        writer in 1u64..200,
    ) {
        let item = VersionedItem::new(ItemId::new(0), 0);
        apply(&item, &ops);

        let before = item.snapshot();
        if let Err(violation) = item.write(Tid::new(writer), 7) {
            prop_assert!(violation.read_version < violation.writer);
            prop_assert!(violation.writer < violation.reader);
            prop_assert_eq!(item.snapshot(), before);
        }
    }

    #[test]
    fn gc_preserves_reads_at_or_above_threshold(
        ops in proptest::collection::vec(op(), 0..64),
        threshold in 1u64..220,
    ) {
        let item = VersionedItem::new(ItemId::new(0), 0);
        let model = apply(&item, &ops);

        item.garbage_collect(Tid::new(threshold));

        let snapshot = item.snapshot();
        prop_assert!(snapshot.verify().is_ok());
        prop_assert!(snapshot.versions.contains_key(&Tid::ZERO));
        prop_assert_eq!(snapshot.max_version, item.max_version());
        for t in threshold..threshold + 40 {
            prop_assert_eq!(item.read(Tid::new(t)).unwrap(), visible(&model, t));
        }
    }
}
