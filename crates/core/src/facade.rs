//! The recording facade
//!
//! A [`Facade`] is a lightweight handle over a source container. Reads go
//! through it transparently; writes and deletions are recorded in a pending
//! patch table instead of touching the source. Reading a slot that holds a
//! nested container lazily materializes a child facade for that slot, so a
//! whole tree can be mutated through one root handle and folded into a new
//! immutable tree afterwards (see [`crate::snapshot`]).
//!
//! ## Bookkeeping
//!
//! - `patches`: pending changes, allocated on first write. Record facades
//!   keep an insertion-ordered map of key → patch; sequence facades keep a
//!   sparse slot table plus an optional length patch.
//! - `children`: per-slot cache of lazily created child facades, allocated
//!   on first nested read. A patch at a slot shadows the cached child.
//! - A deletion of a key present in the source records a [`Patch::Tombstone`];
//!   deleting a key the source never had merely clears any pending patch.
//!
//! ## Write hygiene
//!
//! Two kinds of writes record no change:
//! - writing back the exact child facade previously read from that slot;
//! - with [`Options::reference_check`] enabled, writing a value identical to
//!   the current source slot.
//! Both also clear any pending patch at the slot, which is what makes
//! mutation sequences that restore the original state fold to an empty diff.
//!
//! ## Sequences
//!
//! Reshaping operations (`push`, `pop`, `shift`, `unshift`, `splice`) are
//! not primitives: they are expressed as series of index reads/writes plus a
//! length write. Shrinking the effective length purges slot patches at
//! positions beyond the new length.

use crate::error::{Error, Result};
use crate::segment::Segment;
use crate::value::{Record, Value};
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Behavior options for a facade graph
///
/// Options are fixed at wrap time and inherited by every lazily created
/// child facade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Treat writes that restore a slot to its current source value as no-ops
    ///
    /// Enables identity-stable snapshots after mutation sequences that undo
    /// themselves, such as removing an element and re-inserting it.
    #[serde(default)]
    pub reference_check: bool,
}

/// A pending change recorded against one source slot
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Pending assignment; the value may itself be a facade
    Set(Value),
    /// Pending deletion of a key the source currently has
    Tombstone,
}

impl Patch {
    /// Check if this patch marks a deletion
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Patch::Tombstone)
    }

    /// Get the pending value if this is an assignment
    pub fn value(&self) -> Option<&Value> {
        match self {
            Patch::Set(v) => Some(v),
            Patch::Tombstone => None,
        }
    }
}

/// Bookkeeping for a record-kind source
struct RecordRepr {
    source: Arc<Record>,
    patches: Option<IndexMap<String, Patch>>,
    children: Option<FxHashMap<String, Facade>>,
}

impl RecordRepr {
    fn new(source: Arc<Record>) -> Self {
        RecordRepr {
            source,
            patches: None,
            children: None,
        }
    }
}

/// Bookkeeping for a sequence-kind source
struct SeqRepr {
    source: Arc<Vec<Value>>,
    /// Pending length; `None` means the source length is in effect
    len_patch: Option<usize>,
    /// Sparse slot patches, always at positions below the effective length
    slot_patches: Option<BTreeMap<usize, Patch>>,
    children: Option<FxHashMap<usize, Facade>>,
}

impl SeqRepr {
    fn new(source: Arc<Vec<Value>>) -> Self {
        SeqRepr {
            source,
            len_patch: None,
            slot_patches: None,
            children: None,
        }
    }

    fn effective_len(&self) -> usize {
        self.len_patch.unwrap_or(self.source.len())
    }
}

enum Repr {
    Record(RecordRepr),
    Sequence(SeqRepr),
}

struct Guts {
    revoked: bool,
    repr: Repr,
}

struct Inner {
    guts: RwLock<Guts>,
    /// Root facade of the graph this facade was derived from
    origin: Weak<Inner>,
    options: Options,
}

/// Recording handle over a source container
///
/// Cloning a facade clones the handle, not the bookkeeping: all clones
/// observe and record the same pending changes. The source container is
/// never mutated.
#[derive(Clone)]
pub struct Facade {
    inner: Arc<Inner>,
}

/// Wrap a container in a recording facade
///
/// Idempotent: wrapping a facade returns the same handle. Values that are
/// not recognized containers are rejected with [`Error::NotRecognized`].
pub fn wrap(value: Value, options: Options) -> Result<Facade> {
    match value {
        Value::Facade(f) => Ok(f),
        other => Facade::new_root(other, options),
    }
}

impl Facade {
    fn new_root(source: Value, options: Options) -> Result<Facade> {
        let repr = match source {
            Value::Map(m) => Repr::Record(RecordRepr::new(m)),
            Value::Array(a) => Repr::Sequence(SeqRepr::new(a)),
            other => {
                return Err(Error::NotRecognized {
                    kind: other.kind_name(),
                })
            }
        };
        let inner = Arc::new_cyclic(|weak| Inner {
            guts: RwLock::new(Guts {
                revoked: false,
                repr,
            }),
            origin: weak.clone(),
            options,
        });
        Ok(Facade { inner })
    }

    /// Child facades share the root's origin and options.
    fn child_of(&self, source: &Value) -> Facade {
        let repr = match source {
            Value::Map(m) => Repr::Record(RecordRepr::new(m.clone())),
            Value::Array(a) => Repr::Sequence(SeqRepr::new(a.clone())),
            _ => unreachable!("child facades are created for containers only"),
        };
        Facade {
            inner: Arc::new(Inner {
                guts: RwLock::new(Guts {
                    revoked: false,
                    repr,
                }),
                origin: self.inner.origin.clone(),
                options: self.inner.options,
            }),
        }
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, Guts>> {
        let guts = self.inner.guts.write();
        if guts.revoked {
            return Err(Error::Revoked);
        }
        Ok(guts)
    }

    /// Check whether two handles refer to the same facade
    pub fn ptr_eq(&self, other: &Facade) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The source container this facade records against
    ///
    /// The returned value shares the source allocation; it is usable even
    /// after revocation.
    pub fn source(&self) -> Value {
        match &self.inner.guts.read().repr {
            Repr::Record(r) => Value::Map(r.source.clone()),
            Repr::Sequence(s) => Value::Array(s.source.clone()),
        }
    }

    /// The options this facade graph was created with
    pub fn options(&self) -> Options {
        self.inner.options
    }

    /// The root facade of the graph this facade belongs to
    ///
    /// Returns `None` once the root has been dropped.
    pub fn origin(&self) -> Option<Facade> {
        self.inner.origin.upgrade().map(|inner| Facade { inner })
    }

    /// Check whether this facade records a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self.inner.guts.read().repr, Repr::Sequence(_))
    }

    /// Check whether this facade records a record
    pub fn is_record(&self) -> bool {
        matches!(self.inner.guts.read().repr, Repr::Record(_))
    }

    /// Check whether this facade has been revoked
    pub fn is_revoked(&self) -> bool {
        self.inner.guts.read().revoked
    }

    // ========== Reads ==========

    /// Read one slot
    ///
    /// Pending patches win over the source; a tombstone reads as absent. A
    /// slot holding a nested container materializes (and caches) a child
    /// facade, one per slot. Opaque leaves are returned verbatim. Sequence
    /// positions a pending length exposes past the source read as `Null`.
    pub fn get(&self, seg: impl Into<Segment>) -> Result<Option<Value>> {
        let seg = seg.into();
        let mut guts = self.lock()?;
        match (&mut guts.repr, &seg) {
            (Repr::Record(r), Segment::Key(k)) => Ok(self.record_get(r, k)),
            (Repr::Sequence(s), Segment::Index(i)) => Ok(self.seq_get(s, *i)),
            (Repr::Record(_), Segment::Index(_)) => {
                Err(Error::unsupported("index access on record facade"))
            }
            (Repr::Sequence(_), Segment::Key(_)) => {
                Err(Error::unsupported("key access on sequence facade"))
            }
        }
    }

    fn record_get(&self, r: &mut RecordRepr, key: &str) -> Option<Value> {
        if let Some(patch) = r.patches.as_ref().and_then(|t| t.get(key)) {
            return match patch {
                Patch::Tombstone => None,
                Patch::Set(v) => Some(v.clone()),
            };
        }
        let slot = r.source.get(key)?;
        match slot {
            Value::Map(_) | Value::Array(_) => {
                let children = r.children.get_or_insert_with(FxHashMap::default);
                if let Some(child) = children.get(key) {
                    if child.source().same(slot) {
                        return Some(Value::Facade(child.clone()));
                    }
                }
                let child = self.child_of(slot);
                children.insert(key.to_string(), child.clone());
                Some(Value::Facade(child))
            }
            other => Some(other.clone()),
        }
    }

    fn seq_get(&self, s: &mut SeqRepr, index: usize) -> Option<Value> {
        if let Some(patch) = s.slot_patches.as_ref().and_then(|t| t.get(&index)) {
            return match patch {
                Patch::Tombstone => None,
                Patch::Set(v) => Some(v.clone()),
            };
        }
        if index >= s.effective_len() {
            return None;
        }
        if index >= s.source.len() {
            // hole exposed by a pending length extension
            return Some(Value::Null);
        }
        let slot = &s.source[index];
        match slot {
            Value::Map(_) | Value::Array(_) => {
                let children = s.children.get_or_insert_with(FxHashMap::default);
                if let Some(child) = children.get(&index) {
                    if child.source().same(slot) {
                        return Some(Value::Facade(child.clone()));
                    }
                }
                let child = self.child_of(slot);
                children.insert(index, child.clone());
                Some(Value::Facade(child))
            }
            other => Some(other.clone()),
        }
    }

    /// Patch-aware presence test for one slot
    pub fn contains(&self, seg: impl Into<Segment>) -> Result<bool> {
        let seg = seg.into();
        let guts = self.lock()?;
        match (&guts.repr, &seg) {
            (Repr::Record(r), Segment::Key(k)) => {
                if let Some(patch) = r.patches.as_ref().and_then(|t| t.get(k.as_str())) {
                    return Ok(!patch.is_tombstone());
                }
                Ok(r.source.contains_key(k.as_str()))
            }
            (Repr::Sequence(s), Segment::Index(i)) => {
                if let Some(patch) = s.slot_patches.as_ref().and_then(|t| t.get(i)) {
                    return Ok(!patch.is_tombstone());
                }
                Ok(*i < s.effective_len())
            }
            (Repr::Record(_), Segment::Index(_)) => {
                Err(Error::unsupported("index access on record facade"))
            }
            (Repr::Sequence(_), Segment::Key(_)) => {
                Err(Error::unsupported("key access on sequence facade"))
            }
        }
    }

    /// Enumerate own keys
    ///
    /// Source keys come first in source order, then patch-added keys in
    /// patch insertion order; tombstoned keys are omitted. Sequences
    /// enumerate positions below the effective length.
    pub fn keys(&self) -> Result<Vec<Segment>> {
        let guts = self.lock()?;
        match &guts.repr {
            Repr::Record(r) => {
                let mut out = Vec::with_capacity(r.source.len());
                for key in r.source.keys() {
                    let tombstoned = r
                        .patches
                        .as_ref()
                        .and_then(|t| t.get(key.as_str()))
                        .is_some_and(Patch::is_tombstone);
                    if !tombstoned {
                        out.push(Segment::Key(key.clone()));
                    }
                }
                if let Some(patches) = &r.patches {
                    for (key, patch) in patches {
                        if r.source.contains_key(key.as_str()) || patch.is_tombstone() {
                            continue;
                        }
                        out.push(Segment::Key(key.clone()));
                    }
                }
                Ok(out)
            }
            Repr::Sequence(s) => {
                let eff = s.effective_len();
                let out = (0..eff)
                    .filter(|i| {
                        !s.slot_patches
                            .as_ref()
                            .and_then(|t| t.get(i))
                            .is_some_and(Patch::is_tombstone)
                    })
                    .map(Segment::Index)
                    .collect();
                Ok(out)
            }
        }
    }

    /// Effective length of a sequence facade
    pub fn len(&self) -> Result<usize> {
        let guts = self.lock()?;
        match &guts.repr {
            Repr::Sequence(s) => Ok(s.effective_len()),
            Repr::Record(_) => Err(Error::unsupported("length of record facade")),
        }
    }

    /// Check whether a sequence facade is effectively empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ========== Writes ==========

    /// Write one slot
    ///
    /// Records a pending assignment unless the write is a round-trip of the
    /// child facade cached at this slot, or (with
    /// [`Options::reference_check`]) restores the current source value; both
    /// of those clear any pending patch instead. Writing a sequence position
    /// at or beyond the effective length extends the pending length.
    pub fn set(&self, seg: impl Into<Segment>, value: Value) -> Result<()> {
        let seg = seg.into();
        let mut guts = self.lock()?;
        match (&mut guts.repr, seg) {
            (Repr::Record(r), Segment::Key(key)) => {
                if let Value::Facade(f) = &value {
                    let round_trip = r
                        .children
                        .as_ref()
                        .and_then(|c| c.get(key.as_str()))
                        .is_some_and(|child| child.ptr_eq(f));
                    if round_trip {
                        Self::record_clear(r, &key);
                        return Ok(());
                    }
                } else if self.inner.options.reference_check
                    && r.source.get(key.as_str()).is_some_and(|slot| slot.same(&value))
                {
                    Self::record_clear(r, &key);
                    return Ok(());
                }
                r.patches
                    .get_or_insert_with(IndexMap::new)
                    .insert(key, Patch::Set(value));
                Ok(())
            }
            (Repr::Sequence(s), Segment::Index(index)) => {
                // the extension applies regardless of which branch below
                // records the write
                if index >= s.effective_len() {
                    s.len_patch = Some(index + 1);
                }
                if let Value::Facade(f) = &value {
                    let round_trip = s
                        .children
                        .as_ref()
                        .and_then(|c| c.get(&index))
                        .is_some_and(|child| child.ptr_eq(f));
                    if round_trip {
                        Self::seq_clear(s, index);
                        return Ok(());
                    }
                } else if self.inner.options.reference_check
                    && index < s.source.len()
                    && s.source[index].same(&value)
                {
                    Self::seq_clear(s, index);
                    return Ok(());
                }
                s.slot_patches
                    .get_or_insert_with(BTreeMap::new)
                    .insert(index, Patch::Set(value));
                Ok(())
            }
            (Repr::Record(_), Segment::Index(_)) => {
                Err(Error::unsupported("index access on record facade"))
            }
            (Repr::Sequence(_), Segment::Key(_)) => {
                Err(Error::unsupported("key access on sequence facade"))
            }
        }
    }

    /// Delete one slot
    ///
    /// A key the source currently has records a tombstone; a key the source
    /// never had merely clears any pending patch. Deleting a sequence
    /// position leaves a hole and does not change the length.
    pub fn remove(&self, seg: impl Into<Segment>) -> Result<()> {
        let seg = seg.into();
        let mut guts = self.lock()?;
        match (&mut guts.repr, seg) {
            (Repr::Record(r), Segment::Key(key)) => {
                if r.source.contains_key(key.as_str()) {
                    r.patches
                        .get_or_insert_with(IndexMap::new)
                        .insert(key, Patch::Tombstone);
                } else {
                    Self::record_clear(r, &key);
                }
                Ok(())
            }
            (Repr::Sequence(s), Segment::Index(index)) => {
                if index < s.source.len() {
                    s.slot_patches
                        .get_or_insert_with(BTreeMap::new)
                        .insert(index, Patch::Tombstone);
                } else {
                    Self::seq_clear(s, index);
                }
                Ok(())
            }
            (Repr::Record(_), Segment::Index(_)) => {
                Err(Error::unsupported("index access on record facade"))
            }
            (Repr::Sequence(_), Segment::Key(_)) => {
                Err(Error::unsupported("key access on sequence facade"))
            }
        }
    }

    /// Write the effective length of a sequence facade
    ///
    /// Shrinking purges slot patches at positions beyond the new length.
    /// With [`Options::reference_check`], restoring the source length drops
    /// the pending length patch entirely.
    pub fn set_len(&self, new_len: usize) -> Result<()> {
        let mut guts = self.lock()?;
        match &mut guts.repr {
            Repr::Sequence(s) => {
                let eff = s.effective_len();
                if new_len < eff {
                    if let Some(slots) = &mut s.slot_patches {
                        let _ = slots.split_off(&new_len);
                        if slots.is_empty() {
                            s.slot_patches = None;
                        }
                    }
                }
                if self.inner.options.reference_check && new_len == s.source.len() {
                    s.len_patch = None;
                } else {
                    s.len_patch = Some(new_len);
                }
                Ok(())
            }
            Repr::Record(_) => Err(Error::unsupported("length of record facade")),
        }
    }

    fn record_clear(r: &mut RecordRepr, key: &str) {
        if let Some(patches) = &mut r.patches {
            patches.shift_remove(key);
            if patches.is_empty() {
                r.patches = None;
            }
        }
    }

    fn seq_clear(s: &mut SeqRepr, index: usize) {
        if let Some(slots) = &mut s.slot_patches {
            slots.remove(&index);
            if slots.is_empty() {
                s.slot_patches = None;
            }
        }
    }

    // ========== Sequence reshaping ==========
    //
    // These are not primitives: each is a series of index reads/writes plus
    // a length write, so the write-hygiene rules above decide what actually
    // lands in the patch table.

    /// Append a value to a sequence facade
    pub fn push(&self, value: Value) -> Result<()> {
        let len = self.len()?;
        self.set(len, value)?;
        self.set_len(len + 1)
    }

    /// Remove and return the last element of a sequence facade
    pub fn pop(&self) -> Result<Option<Value>> {
        let len = self.len()?;
        if len == 0 {
            return Ok(None);
        }
        let last = self.get(len - 1)?;
        self.remove(len - 1)?;
        self.set_len(len - 1)?;
        Ok(last)
    }

    /// Remove and return the first element, shifting the rest down
    pub fn shift(&self) -> Result<Option<Value>> {
        let len = self.len()?;
        if len == 0 {
            return Ok(None);
        }
        let first = self.get(0usize)?;
        for i in 1..len {
            let v = self.get(i)?.unwrap_or(Value::Null);
            self.set(i - 1, v)?;
        }
        self.remove(len - 1)?;
        self.set_len(len - 1)?;
        Ok(first)
    }

    /// Insert a value at the front, shifting the rest up
    pub fn unshift(&self, value: Value) -> Result<()> {
        let len = self.len()?;
        for i in (0..len).rev() {
            let v = self.get(i)?.unwrap_or(Value::Null);
            self.set(i + 1, v)?;
        }
        self.set(0usize, value)?;
        self.set_len(len + 1)
    }

    /// Remove `delete_count` elements at `start`, inserting `items` in their
    /// place; returns the removed elements
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        items: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let len = self.len()?;
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);
        let insert_count = items.len();

        let mut removed = Vec::with_capacity(delete_count);
        for j in 0..delete_count {
            removed.push(self.get(start + j)?.unwrap_or(Value::Null));
        }

        if insert_count < delete_count {
            for i in (start + delete_count)..len {
                let v = self.get(i)?.unwrap_or(Value::Null);
                self.set(i - delete_count + insert_count, v)?;
            }
        } else if insert_count > delete_count {
            for i in ((start + delete_count)..len).rev() {
                let v = self.get(i)?.unwrap_or(Value::Null);
                self.set(i + insert_count - delete_count, v)?;
            }
        }
        for (j, item) in items.into_iter().enumerate() {
            self.set(start + j, item)?;
        }
        self.set_len(len - delete_count + insert_count)?;
        Ok(removed)
    }

    // ========== Inspection ==========

    /// Read the pending patch at one slot, if any
    ///
    /// Kind-mismatched segments read as `None`; the pending length of a
    /// sequence is not addressable here (see [`Facade::len`]).
    pub fn patch_at(&self, seg: impl Into<Segment>) -> Result<Option<Patch>> {
        let seg = seg.into();
        let guts = self.lock()?;
        Ok(match (&guts.repr, &seg) {
            (Repr::Record(r), Segment::Key(k)) => {
                r.patches.as_ref().and_then(|t| t.get(k.as_str())).cloned()
            }
            (Repr::Sequence(s), Segment::Index(i)) => {
                s.slot_patches.as_ref().and_then(|t| t.get(i)).cloned()
            }
            _ => None,
        })
    }

    /// Number of pending patches, counting a pending length as one
    pub fn patch_count(&self) -> Result<usize> {
        let guts = self.lock()?;
        Ok(match &guts.repr {
            Repr::Record(r) => r.patches.as_ref().map_or(0, IndexMap::len),
            Repr::Sequence(s) => {
                s.slot_patches.as_ref().map_or(0, BTreeMap::len)
                    + usize::from(s.len_patch.is_some())
            }
        })
    }

    /// Check whether any patch is pending
    pub fn has_patches(&self) -> Result<bool> {
        Ok(self.patch_count()? > 0)
    }

    /// The cached child facade at one slot, if a nested read created one
    pub(crate) fn child_at(&self, seg: &Segment) -> Result<Option<Facade>> {
        let guts = self.lock()?;
        Ok(match (&guts.repr, seg) {
            (Repr::Record(r), Segment::Key(k)) => {
                r.children.as_ref().and_then(|c| c.get(k.as_str())).cloned()
            }
            (Repr::Sequence(s), Segment::Index(i)) => {
                s.children.as_ref().and_then(|c| c.get(i)).cloned()
            }
            _ => None,
        })
    }

    /// Record patches in insertion order; empty for sequence facades
    pub(crate) fn record_patch_list(&self) -> Result<Vec<(String, Patch)>> {
        let guts = self.lock()?;
        Ok(match &guts.repr {
            Repr::Record(r) => r
                .patches
                .as_ref()
                .map(|t| t.iter().map(|(k, p)| (k.clone(), p.clone())).collect())
                .unwrap_or_default(),
            Repr::Sequence(_) => Vec::new(),
        })
    }

    /// Pending length and slot patches in position order; empty for records
    pub(crate) fn seq_patch_list(&self) -> Result<(Option<usize>, Vec<(usize, Patch)>)> {
        let guts = self.lock()?;
        Ok(match &guts.repr {
            Repr::Sequence(s) => (
                s.len_patch,
                s.slot_patches
                    .as_ref()
                    .map(|t| t.iter().map(|(i, p)| (*i, p.clone())).collect())
                    .unwrap_or_default(),
            ),
            Repr::Record(_) => (None, Vec::new()),
        })
    }

    // ========== Revocation ==========

    /// Discard the bookkeeping of this facade and every facade reachable
    /// from it; further access fails with [`Error::Revoked`]
    ///
    /// Revocation walks children and patch values (including facades nested
    /// inside plain containers assigned as patches), guarding against handle
    /// cycles, and drops all tables. This also breaks any reference cycles a
    /// user created by assigning a facade into its own subtree.
    pub fn revoke(&self) {
        let mut stack = vec![self.clone()];
        let mut seen = FxHashSet::default();
        while let Some(facade) = stack.pop() {
            if !seen.insert(Arc::as_ptr(&facade.inner) as usize) {
                continue;
            }
            let mut guts = facade.inner.guts.write();
            if guts.revoked {
                continue;
            }
            guts.revoked = true;
            match &mut guts.repr {
                Repr::Record(r) => {
                    if let Some(children) = r.children.take() {
                        stack.extend(children.into_values());
                    }
                    if let Some(patches) = r.patches.take() {
                        for (_, patch) in patches {
                            if let Patch::Set(v) = patch {
                                collect_facades(&v, &mut stack);
                            }
                        }
                    }
                }
                Repr::Sequence(s) => {
                    s.len_patch = None;
                    if let Some(children) = s.children.take() {
                        stack.extend(children.into_values());
                    }
                    if let Some(slots) = s.slot_patches.take() {
                        for (_, patch) in slots {
                            if let Patch::Set(v) = patch {
                                collect_facades(&v, &mut stack);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Collect facades reachable through plain containers in a patch value.
fn collect_facades(value: &Value, out: &mut Vec<Facade>) {
    match value {
        Value::Facade(f) => out.push(f.clone()),
        Value::Array(items) => {
            for item in items.iter() {
                collect_facades(item, out);
            }
        }
        Value::Map(entries) => {
            for (_, entry) in entries.iter() {
                collect_facades(entry, out);
            }
        }
        _ => {}
    }
}

impl PartialEq for Facade {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl From<Facade> for Value {
    fn from(facade: Facade) -> Self {
        Value::Facade(facade)
    }
}

// Debug stays shallow: a facade can sit inside its own patch table, so
// recursing through patches would not terminate.
impl fmt::Debug for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guts = self.inner.guts.read();
        if guts.revoked {
            return write!(f, "Facade(revoked)");
        }
        match &guts.repr {
            Repr::Record(r) => write!(
                f,
                "Facade(record, {} keys, {} patches)",
                r.source.len(),
                r.patches.as_ref().map_or(0, IndexMap::len)
            ),
            Repr::Sequence(s) => write!(
                f,
                "Facade(sequence, len {}, {} patches)",
                s.effective_len(),
                s.slot_patches.as_ref().map_or(0, BTreeMap::len)
                    + usize::from(s.len_patch.is_some())
            ),
        }
    }
}
