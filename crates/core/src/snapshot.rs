//! Structural-sharing snapshots
//!
//! Folds the pending patches of a facade tree into a new immutable value
//! tree. Unchanged subtrees are shared with the base by reference; each
//! container along a mutated path is cloned exactly once. When nothing
//! effective changed, the base itself is returned, so callers can detect
//! no-op mutations with [`Value::same`].
//!
//! ## Change detection
//!
//! A facade counts as changed against its base only when a patch entry
//! actually differs from the base slot: the values differ by identity, or
//! own-key presence differs. Writing a slot back to a value identical to the
//! base therefore folds to nothing, with or without
//! [`crate::facade::Options::reference_check`].
//!
//! ## Rebase
//!
//! [`snapshot_onto`] folds the changes into a foreign base tree instead of
//! the facade's own source. Record facades interleave their patches into the
//! base slot by slot. Sequence facades do not: positional identity cannot be
//! reconciled across two bases, so a sequence folded onto a distinct base is
//! materialized whole from its own view and replaces the base slot. Where
//! the base cannot accept a fold at all (slot missing, or holding a leaf),
//! the subtree falls back to materializing from its own source.

use crate::error::{Error, Result};
use crate::facade::{Facade, Patch};
use crate::segment::Segment;
use crate::shape::{is_recognized, source_of};
use crate::value::{Record, Value};
use std::sync::Arc;

/// Fold a facade tree into an immutable value tree
///
/// Facades fold onto their own sources. A value without pending changes
/// anywhere folds to itself by identity; the result never contains facades.
pub fn snapshot(value: &Value) -> Result<Value> {
    let mut path = Vec::new();
    Ok(fold(value, None, &mut path)?.value)
}

/// Fold a facade tree onto a foreign base tree
///
/// When nothing effective changed, `base` is returned by identity. A facade
/// handed in as `base` contributes its source.
pub fn snapshot_onto(value: &Value, base: &Value) -> Result<Value> {
    let base = source_of(base);
    let mut path = Vec::new();
    let folded = fold(value, Some(&base), &mut path)?;
    if !folded.changed && matches!(value, Value::Facade(_)) {
        // nothing effective anywhere: the base stands
        return Ok(base);
    }
    Ok(folded.value)
}

/// One folded subtree: the resulting value and whether it differs (by
/// identity) from the base it was folded onto.
struct Folded {
    value: Value,
    changed: bool,
}

impl Folded {
    fn unchanged(value: Value) -> Self {
        Folded {
            value,
            changed: false,
        }
    }
}

fn fold(value: &Value, base: Option<&Value>, path: &mut Vec<Value>) -> Result<Folded> {
    match value {
        Value::Facade(facade) => {
            if facade.is_revoked() {
                return Err(Error::Revoked);
            }
            if path.iter().any(|ancestor| ancestor.same(value)) {
                // cyclic occurrence: materialize the raw source, no descent
                return Ok(Folded::unchanged(facade.source()));
            }
            path.push(value.clone());
            let out = fold_facade(facade, base, path);
            path.pop();
            out
        }
        Value::Array(_) | Value::Map(_) => {
            if path.iter().any(|ancestor| ancestor.same(value)) {
                return Ok(Folded::unchanged(value.clone()));
            }
            path.push(value.clone());
            let out = fold_plain(value, path);
            path.pop();
            out
        }
        leaf => Ok(Folded::unchanged(leaf.clone())),
    }
}

fn fold_facade(facade: &Facade, base: Option<&Value>, path: &mut Vec<Value>) -> Result<Folded> {
    let base = base.map(source_of);
    match facade.source() {
        Value::Map(source) => {
            // a base slot that cannot accept a record fold falls back to the
            // facade's own source
            let base_map = match &base {
                Some(Value::Map(b)) => b.clone(),
                _ => source.clone(),
            };
            fold_record(facade, &source, &base_map, path)
        }
        Value::Array(source) => {
            // sequences always fold onto their own source; a distinct base
            // is replaced wholesale by the folded sequence
            fold_sequence(facade, &source, path)
        }
        _ => Err(Error::InvariantViolation(
            "facade source is not a container".to_string(),
        )),
    }
}

enum RecordOp {
    Set(String, Value),
    Remove(String),
}

fn fold_record(
    facade: &Facade,
    source: &Arc<Record>,
    base: &Arc<Record>,
    path: &mut Vec<Value>,
) -> Result<Folded> {
    let mut ops = Vec::new();

    // dirty children first, in source order; a patch at the slot shadows the
    // cached child entirely
    for key in source.keys() {
        let seg = Segment::Key(key.clone());
        if facade.patch_at(seg.clone())?.is_some() {
            continue;
        }
        let Some(child) = facade.child_at(&seg)? else {
            continue;
        };
        let folded = fold(&Value::Facade(child), base.get(key.as_str()), path)?;
        if folded.changed {
            ops.push(RecordOp::Set(key.clone(), folded.value));
        }
    }

    // patches in insertion order
    for (key, patch) in facade.record_patch_list()? {
        match patch {
            Patch::Tombstone => {
                if base.contains_key(key.as_str()) {
                    ops.push(RecordOp::Remove(key));
                }
            }
            Patch::Set(v) => {
                let folded = fold(&v, None, path)?;
                let differs = base
                    .get(key.as_str())
                    .map_or(true, |slot| !folded.value.same(slot));
                if differs {
                    ops.push(RecordOp::Set(key, folded.value));
                }
            }
        }
    }

    if ops.is_empty() {
        return Ok(Folded::unchanged(Value::Map(base.clone())));
    }
    let mut out = base.as_ref().clone();
    for op in ops {
        match op {
            RecordOp::Set(key, value) => {
                out.insert(key, value);
            }
            RecordOp::Remove(key) => {
                out.shift_remove(key.as_str());
            }
        }
    }
    Ok(Folded {
        value: Value::Map(Arc::new(out)),
        changed: true,
    })
}

fn fold_sequence(
    facade: &Facade,
    source: &Arc<Vec<Value>>,
    path: &mut Vec<Value>,
) -> Result<Folded> {
    let (len_patch, slot_patches) = facade.seq_patch_list()?;
    let effective_len = len_patch.unwrap_or(source.len());
    let mut changed = effective_len != source.len();
    let mut ops: Vec<(usize, Value)> = Vec::new();

    for (i, slot) in source.iter().enumerate().take(effective_len) {
        let seg = Segment::Index(i);
        if facade.patch_at(i)?.is_some() {
            continue;
        }
        let Some(child) = facade.child_at(&seg)? else {
            continue;
        };
        let folded = fold(&Value::Facade(child), Some(slot), path)?;
        if folded.changed {
            ops.push((i, folded.value));
        }
    }

    for (i, patch) in slot_patches {
        match patch {
            // a deleted position reads as absent; the folded sequence
            // carries null there and keeps its length
            Patch::Tombstone => ops.push((i, Value::Null)),
            Patch::Set(v) => {
                let folded = fold(&v, None, path)?;
                let differs = source
                    .get(i)
                    .map_or(true, |slot| !folded.value.same(slot));
                if differs {
                    ops.push((i, folded.value));
                }
            }
        }
    }

    if ops.is_empty() && !changed {
        return Ok(Folded::unchanged(Value::Array(source.clone())));
    }
    changed = true;
    let mut out: Vec<Value> = source.iter().take(effective_len).cloned().collect();
    out.resize(effective_len, Value::Null);
    for (i, value) in ops {
        out[i] = value;
    }
    Ok(Folded {
        value: Value::Array(Arc::new(out)),
        changed,
    })
}

fn fold_plain(value: &Value, path: &mut Vec<Value>) -> Result<Folded> {
    match value {
        Value::Array(items) => {
            let mut replacements: Vec<(usize, Value)> = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if !is_recognized(item) {
                    continue;
                }
                let folded = fold(item, None, path)?;
                if !folded.value.same(item) {
                    replacements.push((i, folded.value));
                }
            }
            if replacements.is_empty() {
                return Ok(Folded::unchanged(value.clone()));
            }
            let mut out = items.as_ref().clone();
            for (i, v) in replacements {
                out[i] = v;
            }
            Ok(Folded {
                value: Value::Array(Arc::new(out)),
                changed: true,
            })
        }
        Value::Map(entries) => {
            let mut replacements: Vec<(String, Value)> = Vec::new();
            for (key, entry) in entries.iter() {
                if !is_recognized(entry) {
                    continue;
                }
                let folded = fold(entry, None, path)?;
                if !folded.value.same(entry) {
                    replacements.push((key.clone(), folded.value));
                }
            }
            if replacements.is_empty() {
                return Ok(Folded::unchanged(value.clone()));
            }
            let mut out = entries.as_ref().clone();
            for (key, v) in replacements {
                out.insert(key, v);
            }
            Ok(Folded {
                value: Value::Map(Arc::new(out)),
                changed: true,
            })
        }
        other => Ok(Folded::unchanged(other.clone())),
    }
}
