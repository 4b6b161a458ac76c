//! Single-writer store over the snapshot engine
//!
//! The store serializes mutator invocations across threads with a re-entrant
//! gate, so a mutator (or a subscriber running at commit time) may call
//! [`Store::apply`] again on the same thread without deadlocking. A depth
//! counter tracks nesting; nested completions commit immediately but
//! notification is coalesced to the moment the depth returns to zero.
//!
//! Async mutators keep the depth raised across suspension. Their fold runs
//! when the future resolves, onto whatever state is committed by then, and
//! subscribers fire at the tail of whichever completion ends at depth zero.

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use vellum_core::{
    is_recognized, snapshot, snapshot_onto, wrap, Error, Facade, Options, Result, Value,
};

/// Behavior options for a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Enable [`Options::reference_check`] on every facade the store hands
    /// to mutators
    #[serde(default)]
    pub reference_check: bool,
}

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

struct ApplyState {
    /// Nesting depth of in-flight mutators, suspended ones included
    depth: usize,
    /// A commit happened since the last notification round
    notify_pending: bool,
}

struct StoreInner {
    /// Serializes mutator invocations across threads; re-entrant so nested
    /// same-thread applies and subscriber-initiated applies never deadlock
    gate: ReentrantMutex<()>,
    state: RwLock<Value>,
    apply_state: Mutex<ApplyState>,
    listeners: RwLock<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    options: StoreOptions,
}

/// Handle to a committed value plus the machinery to mutate it
///
/// Cloning a store clones the handle; all clones share the same committed
/// state and subscribers.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

/// Registration handle returned by [`Store::subscribe`]
///
/// Dropping the handle does not deregister the listener; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Remove the listener this handle registered
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Decrements the depth counter if a mutator unwinds, so a panicking
/// mutator cannot wedge notification for every later apply.
struct DepthGuard {
    inner: Option<Arc<StoreInner>>,
}

impl DepthGuard {
    fn disarm(mut self) {
        self.inner = None;
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        if let Some(inner) = &self.inner {
            inner.apply_state.lock().depth -= 1;
        }
    }
}

impl Store {
    /// Create a store holding `initial` as its committed state
    ///
    /// Facades inside `initial` are folded away first. The committed state
    /// must be a recognized container.
    pub fn new(initial: Value, options: StoreOptions) -> Result<Store> {
        let initial = snapshot(&initial)?;
        if !is_recognized(&initial) {
            return Err(Error::NotRecognized {
                kind: initial.kind_name(),
            });
        }
        Ok(Store {
            inner: Arc::new(StoreInner {
                gate: ReentrantMutex::new(()),
                state: RwLock::new(initial),
                apply_state: Mutex::new(ApplyState {
                    depth: 0,
                    notify_pending: false,
                }),
                listeners: RwLock::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                options,
            }),
        })
    }

    /// The committed state
    pub fn state(&self) -> Value {
        self.inner.state.read().clone()
    }

    /// The options this store was created with
    pub fn options(&self) -> StoreOptions {
        self.inner.options
    }

    /// Register a listener invoked after every outermost completion that
    /// committed a change
    ///
    /// Listeners run in registration order and receive the new committed
    /// state.
    pub fn subscribe(&self, listener: impl Fn(&Value) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Run a mutator against a fresh facade over the committed state
    ///
    /// The mutator may read and mutate freely through the facade, and may
    /// call [`Store::apply`] on the store again; nested invocations observe
    /// whatever earlier completions committed. On return the pending patches
    /// are folded onto the current committed state; a changed result is
    /// committed and, once the outermost invocation completes, subscribers
    /// are notified exactly once.
    ///
    /// The mutator's return value decides what `apply` returns: the facade
    /// itself resolves to the fresh snapshot, any other recognized value to
    /// its own snapshot, and anything else is passed through verbatim. The
    /// facade is revoked once the fold is taken.
    pub fn apply<F>(&self, mutator: F) -> Result<Value>
    where
        F: FnOnce(&Facade, &Store) -> Result<Value>,
    {
        let _gate = self.inner.gate.lock();
        let facade = wrap(self.state(), self.facade_options())?;
        self.enter();
        let guard = DepthGuard {
            inner: Some(self.inner.clone()),
        };
        let out = mutator(&facade, self);
        guard.disarm();
        self.complete(&facade, out)
    }

    /// Async variant of [`Store::apply`]
    ///
    /// The depth counter stays raised across suspension, so notification is
    /// deferred until the future resolves and whichever completion returns
    /// the depth to zero fires the subscribers. The fold runs at resolution
    /// time, onto the state committed by then.
    pub async fn apply_async<F, Fut>(&self, mutator: F) -> Result<Value>
    where
        F: FnOnce(Facade, Store) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let facade = {
            let _gate = self.inner.gate.lock();
            wrap(self.state(), self.facade_options())?
        };
        self.enter();
        let guard = DepthGuard {
            inner: Some(self.inner.clone()),
        };
        let out = mutator(facade.clone(), self.clone()).await;
        guard.disarm();
        let _gate = self.inner.gate.lock();
        self.complete(&facade, out)
    }

    fn facade_options(&self) -> Options {
        Options {
            reference_check: self.inner.options.reference_check,
        }
    }

    fn enter(&self) {
        self.inner.apply_state.lock().depth += 1;
    }

    fn complete(&self, facade: &Facade, out: Result<Value>) -> Result<Value> {
        let result = match out {
            Ok(returned) => self.fold_and_commit(facade, returned),
            Err(e) => Err(e),
        };
        facade.revoke();
        self.leave_and_notify();
        result
    }

    fn fold_and_commit(&self, facade: &Facade, returned: Value) -> Result<Value> {
        let root = Value::Facade(facade.clone());
        // nested invocations may have advanced the committed state since
        // this facade was created; fold onto whatever is current now
        let current = self.state();
        let snap = snapshot_onto(&root, &current)?;
        let changed = !snap.same(&current);
        if changed {
            *self.inner.state.write() = snap.clone();
            self.inner.apply_state.lock().notify_pending = true;
            debug!(target: "vellum::store", "state committed");
        } else {
            trace!(target: "vellum::store", "mutation folded to no-op");
        }
        // resolve the mutator's return value before the facade is revoked
        let resolved = if matches!(&returned, Value::Facade(f) if f.ptr_eq(facade)) {
            snap
        } else if is_recognized(&returned) {
            snapshot(&returned)?
        } else {
            returned
        };
        Ok(resolved)
    }

    fn leave_and_notify(&self) {
        let fire = {
            let mut apply_state = self.inner.apply_state.lock();
            apply_state.depth -= 1;
            if apply_state.depth == 0 && apply_state.notify_pending {
                apply_state.notify_pending = false;
                true
            } else {
                false
            }
        };
        if fire {
            let state = self.state();
            let listeners: Vec<Listener> = self
                .inner
                .listeners
                .read()
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            trace!(
                target: "vellum::store",
                subscribers = listeners.len(),
                "notifying subscribers"
            );
            for listener in listeners {
                listener(&state);
            }
        }
    }
}
