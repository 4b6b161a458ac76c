//! Store layer for vellum: committed state, re-entrant mutation, and
//! subscriber notification
//!
//! A [`Store`] owns one committed immutable value. Mutators receive a fresh
//! recording facade over that value; when a mutator returns, its pending
//! patches are folded onto whatever state is committed at that moment and,
//! if the fold produced a different tree, the result replaces the committed
//! state. Subscribers are notified once per outermost completion that
//! observed a change, however many nested mutations ran inside it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod store;

pub use store::{Store, StoreOptions, Subscription};
