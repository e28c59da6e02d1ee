//! Per-place referent table
//!
//! Reference-typed properties carry stable referent strings across
//! serializations. Decoders register every object's referent here; the
//! sync-in executor routes reference-flagged properties through
//! `resolve_or_defer`, and `finalize` applies whatever became resolvable
//! once the whole tree has been linked.

use std::collections::BTreeMap;

use tracing::warn;

use crate::tree::{ObjectId, Tree};
use crate::value::Value;

/// A property waiting for its referent to become known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropRef {
    pub object: ObjectId,
    pub property: String,
    pub referent: String,
}

/// Referent string to object mapping with deferred property fixups.
#[derive(Debug, Default)]
pub struct RefTable {
    by_referent: BTreeMap<String, ObjectId>,
    pending: Vec<PropRef>,
    next_generated: u64,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object under its referent. Empty referents are ignored.
    pub fn register(&mut self, referent: &str, id: ObjectId) {
        if !referent.is_empty() {
            self.by_referent.insert(referent.to_string(), id);
        }
    }

    /// Make sure `id` has a referent and is registered; generates a
    /// deterministic one for objects that were decoded without any.
    pub fn ensure_registered(&mut self, tree: &mut Tree, id: ObjectId) {
        if tree.referent(id).is_empty() {
            let generated = format!("RBXFS{:08}", self.next_generated);
            self.next_generated += 1;
            tree.set_referent(id, generated);
        }
        let referent = tree.referent(id).to_string();
        self.by_referent.insert(referent, id);
    }

    pub fn lookup(&self, referent: &str) -> Option<ObjectId> {
        self.by_referent.get(referent).copied()
    }

    /// Set `prop_ref.property` to a reference value if the target is
    /// already known; otherwise queue the fixup for `finalize`.
    pub fn resolve_or_defer(&mut self, tree: &mut Tree, prop_ref: PropRef) -> bool {
        if self.by_referent.contains_key(&prop_ref.referent) {
            tree.set_property(
                prop_ref.object,
                prop_ref.property,
                Value::Reference(prop_ref.referent),
            );
            true
        } else {
            self.pending.push(prop_ref);
            false
        }
    }

    /// Resolve every deferred fixup that became satisfiable; drop the rest
    /// with a warning. Returns the number dropped.
    pub fn finalize(&mut self, tree: &mut Tree) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut dropped = 0;
        for prop_ref in pending {
            if self.by_referent.contains_key(&prop_ref.referent) {
                tree.set_property(
                    prop_ref.object,
                    prop_ref.property,
                    Value::Reference(prop_ref.referent),
                );
            } else {
                warn!(
                    referent = %prop_ref.referent,
                    property = %prop_ref.property,
                    "dropping unresolved reference"
                );
                dropped += 1;
            }
        }
        dropped
    }
}
