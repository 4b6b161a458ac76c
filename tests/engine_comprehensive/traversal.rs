//! Traversal across patches, children, and plain intermediates

use serde_json::json;
use vellum::{traverse, wrap, Options, Order, Segment, Value, Visit};

fn v(json: serde_json::Value) -> Value {
    Value::from_json(json)
}

fn paths(root: &Value, order: Order) -> Vec<Vec<Segment>> {
    let mut out = Vec::new();
    traverse(
        root,
        |_, _, keys| {
            out.push(keys.to_vec());
            Visit::Descend
        },
        order,
    )
    .unwrap();
    out
}

#[test]
fn patched_containers_win_over_cached_children() {
    let p = wrap(v(json!({"slot": {"old": 1}})), Options::default()).unwrap();
    // materialize the child, then shadow it with a patched replacement
    p.get("slot").unwrap();
    let replacement = wrap(v(json!({"new": 2})), Options::default()).unwrap();
    p.set("slot", Value::Facade(replacement.clone())).unwrap();

    let mut visited = Vec::new();
    traverse(
        &Value::Facade(p.clone()),
        |facade, _, keys| {
            visited.push((keys.to_vec(), facade.clone()));
            Visit::Descend
        },
        Order::ParentFirst,
    )
    .unwrap();

    assert_eq!(visited.len(), 2);
    assert!(visited[1].1.ptr_eq(&replacement));
    assert_eq!(visited[1].0, vec![Segment::key("slot")]);
}

#[test]
fn child_first_order_reverses_parent_and_children() {
    let p = wrap(v(json!({"a": {"b": {}}})), Options::default()).unwrap();
    let a = p.get("a").unwrap().unwrap();
    a.as_facade().unwrap().get("b").unwrap();

    let root = Value::Facade(p);
    assert_eq!(
        paths(&root, Order::ParentFirst),
        vec![
            vec![],
            vec![Segment::key("a")],
            vec![Segment::key("a"), Segment::key("b")],
        ]
    );
    assert_eq!(
        paths(&root, Order::ChildFirst),
        vec![
            vec![Segment::key("a"), Segment::key("b")],
            vec![Segment::key("a")],
            vec![],
        ]
    );
}

#[test]
fn path_values_cover_plain_intermediates() {
    let p = wrap(v(json!({"foo": {"n": 1}})), Options::default()).unwrap();
    let foo = p.get("foo").unwrap().unwrap();
    p.set(
        "wrapped",
        Value::array(vec![Value::map_from([("inner", foo)])]),
    )
    .unwrap();

    let mut seen = Vec::new();
    traverse(
        &Value::Facade(p.clone()),
        |_, values, keys| {
            seen.push((values.len(), keys.to_vec()));
            Visit::Descend
        },
        Order::ParentFirst,
    )
    .unwrap();

    // root facade, the child read at "foo", then the same facade again
    // below [wrapped][0][inner] with the literal array and map on the path
    assert_eq!(
        seen,
        vec![
            (1, vec![]),
            (2, vec![Segment::key("foo")]),
            (
                4,
                vec![
                    Segment::key("wrapped"),
                    Segment::index(0),
                    Segment::key("inner"),
                ]
            ),
        ]
    );
}

#[test]
fn mutual_facade_cycle_terminates() {
    let p = wrap(v(json!({"out": null})), Options::default()).unwrap();
    let q = wrap(v(json!({"back": null})), Options::default()).unwrap();
    p.set("out", Value::Facade(q.clone())).unwrap();
    q.set("back", Value::Facade(p.clone())).unwrap();

    let log = paths(&Value::Facade(p.clone()), Order::ParentFirst);
    // p, then q below it; the route back up is pruned
    assert_eq!(log, vec![vec![], vec![Segment::key("out")]]);

    p.revoke();
    q.revoke();
}

#[test]
fn tombstoned_and_opaque_slots_are_not_descended() {
    let p = wrap(
        v(json!({"gone": {"a": 1}, "num": 2, "kept": {"b": 3}})),
        Options::default(),
    )
    .unwrap();
    p.get("gone").unwrap();
    p.get("kept").unwrap();
    p.remove("gone").unwrap();
    p.set("num", Value::I64(5)).unwrap();

    let log = paths(&Value::Facade(p), Order::ParentFirst);
    assert_eq!(log, vec![vec![], vec![Segment::key("kept")]]);
}
