//! Facade-tree traversal
//!
//! Walks every facade reachable from a root value: through patch values,
//! through lazily created children, and through plain containers a user
//! assigned into patches (those are part of the path but never visited
//! themselves). The visitor sees each facade once per distinct path together
//! with the containers and keys leading to it.
//!
//! Cycles are guarded by scanning the current path for an identical
//! container before descending. The guard is O(depth) and per-path: the same
//! facade reached along two different routes is visited twice, but never
//! twice along one route.

use crate::error::Result;
use crate::facade::{Facade, Patch};
use crate::segment::Segment;
use crate::shape::is_recognized;
use crate::value::Value;

/// Visit order for [`traverse`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Visit a facade before its children; the visitor may prune descent
    #[default]
    ParentFirst,
    /// Visit all children of a facade before the facade itself
    ///
    /// The subtree is already exhausted when the visitor runs, so its
    /// verdict cannot prune anything and is ignored.
    ChildFirst,
}

/// Visitor verdict for [`traverse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Continue into the subtree below this facade
    Descend,
    /// Skip the subtree below this facade
    Skip,
}

/// Walk every facade reachable from `root`
///
/// The visitor receives the facade, the containers from the root to the
/// facade inclusive, and the keys taken (one fewer). Returns any error the
/// bookkeeping reads raise, e.g. on a revoked facade.
pub fn traverse<F>(root: &Value, mut visitor: F, order: Order) -> Result<()>
where
    F: FnMut(&Facade, &[Value], &[Segment]) -> Visit,
{
    let mut values = Vec::new();
    let mut keys = Vec::new();
    walk(root, &mut values, &mut keys, &mut visitor, order)
}

fn walk<F>(
    value: &Value,
    values: &mut Vec<Value>,
    keys: &mut Vec<Segment>,
    visitor: &mut F,
    order: Order,
) -> Result<()>
where
    F: FnMut(&Facade, &[Value], &[Segment]) -> Visit,
{
    match value {
        Value::Facade(facade) => {
            values.push(value.clone());
            let verdict = match order {
                Order::ParentFirst => visitor(facade, values, keys),
                Order::ChildFirst => Visit::Descend,
            };
            let result = if verdict == Visit::Descend {
                descend_facade(facade, values, keys, visitor, order)
            } else {
                Ok(())
            };
            if result.is_ok() && order == Order::ChildFirst {
                let _ = visitor(facade, values, keys);
            }
            values.pop();
            result
        }
        Value::Array(_) | Value::Map(_) => {
            values.push(value.clone());
            let result = descend_plain(value, values, keys, visitor, order);
            values.pop();
            result
        }
        _ => Ok(()),
    }
}

/// Discover the children of a facade in own-key order.
///
/// A patch holding a recognized container wins over the cached child for the
/// same slot; opaque and tombstoned slots are skipped.
fn descend_facade<F>(
    facade: &Facade,
    values: &mut Vec<Value>,
    keys: &mut Vec<Segment>,
    visitor: &mut F,
    order: Order,
) -> Result<()>
where
    F: FnMut(&Facade, &[Value], &[Segment]) -> Visit,
{
    for seg in facade.keys()? {
        let target = match facade.patch_at(seg.clone())? {
            Some(Patch::Set(v)) if is_recognized(&v) => Some(v),
            Some(_) => None,
            None => facade.child_at(&seg)?.map(Value::Facade),
        };
        let Some(target) = target else { continue };
        if values.iter().any(|ancestor| ancestor.same(&target)) {
            continue;
        }
        keys.push(seg);
        let result = walk(&target, values, keys, visitor, order);
        keys.pop();
        result?;
    }
    Ok(())
}

/// Descend through a plain container reached via a patch without visiting it.
fn descend_plain<F>(
    value: &Value,
    values: &mut Vec<Value>,
    keys: &mut Vec<Segment>,
    visitor: &mut F,
    order: Order,
) -> Result<()>
where
    F: FnMut(&Facade, &[Value], &[Segment]) -> Visit,
{
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if !is_recognized(item) {
                    continue;
                }
                if values.iter().any(|ancestor| ancestor.same(item)) {
                    continue;
                }
                keys.push(Segment::Index(i));
                let result = walk(item, values, keys, visitor, order);
                keys.pop();
                result?;
            }
            Ok(())
        }
        Value::Map(entries) => {
            for (key, entry) in entries.iter() {
                if !is_recognized(entry) {
                    continue;
                }
                if values.iter().any(|ancestor| ancestor.same(entry)) {
                    continue;
                }
                keys.push(Segment::Key(key.clone()));
                let result = walk(entry, values, keys, visitor, order);
                keys.pop();
                result?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
