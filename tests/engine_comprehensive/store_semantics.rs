//! Store behavior at the public surface: commits, subscribers, nesting,
//! and async mutators

use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vellum::{Store, StoreOptions, Value};

fn store_with(json: serde_json::Value) -> Store {
    Store::new(Value::from_json(json), StoreOptions::default()).unwrap()
}

#[test]
fn subscribers_fire_in_registration_order_with_the_new_state() {
    let store = store_with(json!({"n": 0}));
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = order.clone();
    let _a = store.subscribe(move |state| {
        assert_eq!(state.get("n"), Some(&Value::I64(1)));
        first.lock().push("first");
    });
    let second = order.clone();
    let _b = store.subscribe(move |_| {
        second.lock().push("second");
    });

    store
        .apply(|facade, _| {
            facade.set("n", Value::I64(1))?;
            Ok(Value::Null)
        })
        .unwrap();

    assert_eq!(order.lock().clone(), vec!["first", "second"]);
}

#[test]
fn committed_state_shares_untouched_subtrees_across_commits() {
    let store = store_with(json!({"stable": {"x": 1}, "hot": {"y": 2}}));
    let before = store.state();

    store
        .apply(|facade, _| {
            let hot = facade.get("hot")?.unwrap();
            hot.as_facade().unwrap().set("y", Value::I64(3))?;
            Ok(Value::Null)
        })
        .unwrap();

    let after = store.state();
    assert!(after
        .get("stable")
        .unwrap()
        .same(before.get("stable").unwrap()));
    assert!(!after.get("hot").unwrap().same(before.get("hot").unwrap()));
}

#[test]
fn returning_the_facade_yields_the_committed_snapshot() {
    let store = store_with(json!({"n": 0}));
    let out = store
        .apply(|facade, _| {
            facade.set("n", Value::I64(7))?;
            Ok(Value::Facade(facade.clone()))
        })
        .unwrap();
    assert!(out.same(&store.state()));
}

#[test]
fn deeply_nested_applies_commit_in_order_and_notify_once() {
    let store = store_with(json!({"log": []}));
    let fired = Arc::new(AtomicUsize::new(0));
    let observed = fired.clone();
    let _sub = store.subscribe(move |_| {
        observed.fetch_add(1, Ordering::SeqCst);
    });

    let append = |store: &Store, n: i64| {
        store
            .apply(move |facade, _| {
                let log = facade.get("log")?.unwrap();
                log.as_facade().unwrap().push(Value::I64(n))?;
                Ok(Value::Null)
            })
            .unwrap();
    };

    store
        .apply(|_, store| {
            append(store, 1);
            store.apply(|_, store| {
                append(store, 2);
                Ok(Value::Null)
            })?;
            append(store, 3);
            Ok(Value::Null)
        })
        .unwrap();

    assert_eq!(store.state(), Value::from_json(json!({"log": [1, 2, 3]})));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn aborting_by_restoring_slots_produces_no_notification() {
    let store = Store::new(
        Value::from_json(json!({"n": 1})),
        StoreOptions {
            reference_check: true,
        },
    )
    .unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let observed = fired.clone();
    let _sub = store.subscribe(move |_| {
        observed.fetch_add(1, Ordering::SeqCst);
    });

    store
        .apply(|facade, _| {
            facade.set("n", Value::I64(99))?;
            // cancel the effective diff before returning
            facade.set("n", Value::I64(1))?;
            Ok(Value::Null)
        })
        .unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn overlapped_async_applies_serialize_by_resolution_order() {
    let store = store_with(json!({"a": 0, "b": 0}));

    let slow = store.apply_async(|facade, _| async move {
        facade.set("a", Value::I64(1))?;
        tokio::task::yield_now().await;
        Ok(Value::Null)
    });
    let fast = store.apply_async(|facade, _| async move {
        facade.set("b", Value::I64(2))?;
        Ok(Value::Null)
    });

    // both folds land, whichever resolves first
    let (r1, r2) = tokio::join!(slow, fast);
    r1.unwrap();
    r2.unwrap();
    assert_eq!(store.state(), Value::from_json(json!({"a": 1, "b": 2})));
}
