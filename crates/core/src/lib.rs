//! Core engine for vellum: value model, recording facades, traversal, and
//! structural-sharing snapshots
//!
//! This crate defines the foundational pieces the store layer builds on:
//! - Value: unified enum for scalars, opaque leaves, and containers
//! - Segment: slot addressing (record key or sequence position)
//! - Shape predicates: which values are traversed and wrapped
//! - Facade: recording wrapper that captures mutations as pending patches
//! - Traversal: cycle-safe walk over every reachable facade
//! - Snapshot: fold of pending patches into a new immutable tree, sharing
//!   unchanged subtrees with the base, with optional rebase onto a foreign
//!   base tree
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod facade;
pub mod segment;
pub mod shape;
pub mod snapshot;
pub mod traverse;
pub mod value;

// Re-export commonly used types and functions
pub use error::{Error, Result};
pub use facade::{wrap, Facade, Options, Patch};
pub use segment::Segment;
pub use shape::{facade_of, is_facade, is_recognized, kind_of, source_of, Kind};
pub use snapshot::{snapshot, snapshot_onto};
pub use traverse::{traverse, Order, Visit};
pub use value::{OpaqueHandle, Record, Value};
