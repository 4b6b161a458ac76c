//! End-to-end scenarios exercising the facade/snapshot contract at the
//! public surface

use serde_json::json;
use vellum::{snapshot, snapshot_onto, traverse, wrap, Options, Order, Value, Visit};

fn v(json: serde_json::Value) -> Value {
    Value::from_json(json)
}

fn with_reference_check() -> Options {
    Options {
        reference_check: true,
    }
}

#[test]
fn noop_snapshot_returns_the_source_identically() {
    for options in [Options::default(), with_reference_check()] {
        let source = v(json!({"foo": {"bar": 123}}));
        let p = wrap(source.clone(), options).unwrap();
        let foo = p.get("foo").unwrap().unwrap();
        foo.as_facade().unwrap().set("bar", Value::I64(123)).unwrap();
        let snap = snapshot(&Value::Facade(p)).unwrap();
        assert!(snap.same(&source));
    }
}

#[test]
fn sequence_scramble_with_reference_check_folds_to_identity() {
    let a = v(json!({"tag": "a"}));
    let b = v(json!({"tag": "b"}));
    let c = v(json!({"tag": "c"}));
    let source = Value::array(vec![a, b.clone(), c]);

    let p = wrap(source.clone(), with_reference_check()).unwrap();
    p.splice(1, 1, vec![]).unwrap();
    p.splice(1, 0, vec![b]).unwrap();

    assert_eq!(p.patch_count().unwrap(), 0);
    let snap = snapshot(&Value::Facade(p)).unwrap();
    assert!(snap.same(&source));
}

#[test]
fn shallow_edit_shares_the_untouched_subtree() {
    let source = v(json!({"foo": 123, "zzz": {"www": "abc"}}));
    let p = wrap(source.clone(), Options::default()).unwrap();
    p.get("zzz").unwrap();
    p.remove("foo").unwrap();
    p.set("bar", Value::I64(456)).unwrap();

    let snap = snapshot(&Value::Facade(p)).unwrap();
    assert_eq!(snap, v(json!({"zzz": {"www": "abc"}, "bar": 456})));
    assert!(snap.get("zzz").unwrap().same(source.get("zzz").unwrap()));
}

#[test]
fn deep_edit_clones_the_path_and_shares_the_rest() {
    let source = v(json!({"foo": {"bar": 123}, "zzz": {"www": "abc"}}));
    let p = wrap(source.clone(), Options::default()).unwrap();
    let foo = p.get("foo").unwrap().unwrap();
    let foo = foo.as_facade().unwrap();
    foo.remove("bar").unwrap();
    foo.set("qux", Value::I64(456)).unwrap();

    let snap = snapshot(&Value::Facade(p)).unwrap();
    assert_eq!(snap, v(json!({"foo": {"qux": 456}, "zzz": {"www": "abc"}})));
    assert!(snap.get("zzz").unwrap().same(source.get("zzz").unwrap()));
    assert!(!snap.get("foo").unwrap().same(source.get("foo").unwrap()));
}

#[test]
fn cyclic_patch_is_traversed_exactly_once() {
    let p = wrap(v(json!({"a": null})), Options::default()).unwrap();
    p.set("a", Value::Facade(p.clone())).unwrap();

    let mut visits = Vec::new();
    traverse(
        &Value::Facade(p.clone()),
        |facade, values, keys| {
            visits.push((values.len(), keys.len()));
            assert!(facade.ptr_eq(&p));
            Visit::Descend
        },
        Order::ParentFirst,
    )
    .unwrap();
    assert_eq!(visits, vec![(1, 0)]);
    p.revoke();
}

#[test]
fn rebase_takes_sequences_whole_from_the_facade_view() {
    let source = v(json!({"foo": [{"bar": 123}]}));
    let p = wrap(source, Options::default()).unwrap();
    let foo = p.get("foo").unwrap().unwrap();
    let first = foo.as_facade().unwrap().get(0usize).unwrap().unwrap();
    first
        .as_facade()
        .unwrap()
        .set("qux", Value::from("abc"))
        .unwrap();

    let base = v(json!({"foo": [{"www": 456}]}));
    let snap = snapshot_onto(&Value::Facade(p), &base).unwrap();
    assert_eq!(snap, v(json!({"foo": [{"bar": 123, "qux": "abc"}]})));
}

#[test]
fn literal_intermediate_is_attached_verbatim() {
    let source = v(json!({"foo": {"bar": 123}}));
    let p = wrap(source.clone(), Options::default()).unwrap();
    let foo = p.get("foo").unwrap().unwrap();
    p.set("foo", Value::map_from([("qux", foo)])).unwrap();

    let snap = snapshot(&Value::Facade(p)).unwrap();
    assert_eq!(snap, v(json!({"foo": {"qux": {"bar": 123}}})));
    assert!(snap
        .get("foo")
        .unwrap()
        .get("qux")
        .unwrap()
        .same(source.get("foo").unwrap()));
}
