//! Property tests over randomly generated value trees

use proptest::prelude::*;
use vellum::{is_recognized, snapshot, wrap, Options, Segment, Value};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::I64),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn arb_tree() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::array),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..4)
                .prop_map(Value::map_from),
        ]
    })
}

proptest! {
    #[test]
    fn snapshot_without_writes_is_identity(tree in arb_tree()) {
        if is_recognized(&tree) {
            let p = wrap(tree.clone(), Options::default()).unwrap();
            let snap = snapshot(&Value::Facade(p)).unwrap();
            prop_assert!(snap.same(&tree));
        }
    }

    #[test]
    fn snapshot_is_idempotent(tree in arb_tree()) {
        let s1 = snapshot(&tree).unwrap();
        let s2 = snapshot(&s1).unwrap();
        prop_assert!(s1.same(&s2));
    }

    #[test]
    fn pointwise_restored_writes_fold_to_identity(tree in arb_tree()) {
        if let Some(entries) = tree.as_map() {
            let p = wrap(tree.clone(), Options { reference_check: true }).unwrap();
            for (key, original) in entries.iter() {
                p.set(key.as_str(), Value::from("scrambled")).unwrap();
                p.set(key.as_str(), original.clone()).unwrap();
            }
            prop_assert!(!p.has_patches().unwrap());
            let snap = snapshot(&Value::Facade(p)).unwrap();
            prop_assert!(snap.same(&tree));
        }
    }

    #[test]
    fn enumeration_matches_snapshot_enumeration(
        tree in arb_tree(),
        writes in proptest::collection::vec(("[a-z]{1,6}", arb_scalar()), 0..6),
        removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..3),
    ) {
        if tree.as_map().is_none() {
            return Ok(());
        }
        let p = wrap(tree.clone(), Options::default()).unwrap();
        for (key, value) in writes {
            p.set(key.as_str(), value).unwrap();
        }
        let source_keys: Vec<String> =
            tree.as_map().unwrap().keys().cloned().collect();
        if !source_keys.is_empty() {
            for pick in removals {
                let key = &source_keys[pick.index(source_keys.len())];
                p.remove(key.as_str()).unwrap();
            }
        }

        let facade_keys = p.keys().unwrap();
        let snap = snapshot(&Value::Facade(p)).unwrap();
        let snap_keys: Vec<Segment> = snap
            .as_map()
            .unwrap()
            .keys()
            .map(|k| Segment::key(k.clone()))
            .collect();
        prop_assert_eq!(facade_keys, snap_keys);
    }

    #[test]
    fn sequence_push_pop_round_trip_is_identity(
        tree in proptest::collection::vec(arb_tree(), 0..5).prop_map(Value::array),
        extra in arb_scalar(),
    ) {
        let p = wrap(tree.clone(), Options { reference_check: true }).unwrap();
        p.push(extra).unwrap();
        p.pop().unwrap();
        prop_assert_eq!(p.patch_count().unwrap(), 0);
        let snap = snapshot(&Value::Facade(p)).unwrap();
        prop_assert!(snap.same(&tree));
    }
}
