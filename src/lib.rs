//! # Vellum
//!
//! An immutable-snapshot state engine: hand out a recording facade over a
//! value tree, mutate it like an ordinary container, and fold the recorded
//! changes into a new immutable tree that shares every untouched subtree
//! with the original.
//!
//! # Quick Start
//!
//! ```
//! use vellum::{snapshot, wrap, Options, Value};
//!
//! fn main() -> vellum::Result<()> {
//!     let v = Value::from_json(serde_json::json!({
//!         "user": {"name": "Alice"},
//!         "settings": {"theme": "dark"},
//!     }));
//!
//!     let p = wrap(v.clone(), Options::default())?;
//!     let user = p.get("user")?.unwrap();
//!     user.as_facade().unwrap().set("name", Value::from("Bob"))?;
//!
//!     let next = snapshot(&Value::Facade(p))?;
//!     // the mutated path was cloned; the untouched sibling is shared
//!     assert!(!next.get("user").unwrap().same(v.get("user").unwrap()));
//!     assert!(next.get("settings").unwrap().same(v.get("settings").unwrap()));
//!     Ok(())
//! }
//! ```
//!
//! # Store
//!
//! ```
//! use vellum::{Store, StoreOptions, Value};
//!
//! fn main() -> vellum::Result<()> {
//!     let store = Store::new(
//!         Value::from_json(serde_json::json!({"count": 0})),
//!         StoreOptions::default(),
//!     )?;
//!     let _sub = store.subscribe(|state| println!("committed: {:?}", state));
//!
//!     store.apply(|facade, _| {
//!         let n = facade.get("count")?.and_then(|v| v.as_i64()).unwrap_or(0);
//!         facade.set("count", Value::I64(n + 1))?;
//!         Ok(Value::Null)
//!     })?;
//!
//!     assert_eq!(store.state().get("count"), Some(&Value::I64(1)));
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The engine core ([`vellum_core`]) provides the value model, the recording
//! facade, traversal, and the structural-sharing snapshot fold (including
//! rebase onto a foreign base tree). The store layer ([`vellum_store`])
//! serializes mutators, tracks re-entrancy, and fans out notifications.
//! Only the surface re-exported here is stable.

// Re-export the public API from the core and store crates
pub use vellum_core::{
    facade_of, is_facade, is_recognized, kind_of, snapshot, snapshot_onto, source_of, traverse,
    wrap, Error, Facade, Kind, Options, OpaqueHandle, Order, Patch, Record, Result, Segment,
    Value, Visit,
};
pub use vellum_store::{Store, StoreOptions, Subscription};
