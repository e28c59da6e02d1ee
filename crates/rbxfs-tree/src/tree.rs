//! Place-scoped object arena
//!
//! All objects of one place live in a single `Tree`; `ObjectId` indices are
//! the stable identities the planners and analyzers key on. The tree is the
//! only owner of object data, so re-parenting during sync-in is an explicit
//! detach-and-attach and an object has at most one parent at any time.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Stable identity of one object within its place's `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Arena slot index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct ObjectData {
    class_name: String,
    referent: String,
    is_service: bool,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    properties: BTreeMap<String, Value>,
}

/// Arena of scene objects for one place.
#[derive(Debug, Default)]
pub struct Tree {
    objects: Vec<ObjectData>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects allocated in this tree.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocate a new parentless object.
    pub fn insert(&mut self, class_name: impl Into<String>) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ObjectData {
            class_name: class_name.into(),
            referent: String::new(),
            is_service: false,
            parent: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
        });
        id
    }

    fn data(&self, id: ObjectId) -> &ObjectData {
        &self.objects[id.index()]
    }

    fn data_mut(&mut self, id: ObjectId) -> &mut ObjectData {
        &mut self.objects[id.index()]
    }

    pub fn class_name(&self, id: ObjectId) -> &str {
        &self.data(id).class_name
    }

    pub fn set_class_name(&mut self, id: ObjectId, class_name: impl Into<String>) {
        self.data_mut(id).class_name = class_name.into();
    }

    pub fn referent(&self, id: ObjectId) -> &str {
        &self.data(id).referent
    }

    pub fn set_referent(&mut self, id: ObjectId, referent: impl Into<String>) {
        self.data_mut(id).referent = referent.into();
    }

    pub fn is_service(&self, id: ObjectId) -> bool {
        self.data(id).is_service
    }

    pub fn set_service(&mut self, id: ObjectId, is_service: bool) {
        self.data_mut(id).is_service = is_service;
    }

    /// The object's name, read from its `Name` property.
    pub fn name(&self, id: ObjectId) -> &str {
        match self.data(id).properties.get("Name") {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) {
        self.set_property(id, "Name", Value::String(name.into()));
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        &self.data(id).children
    }

    /// The `index`-th child, if in bounds.
    pub fn child(&self, id: ObjectId, index: usize) -> Option<ObjectId> {
        self.data(id).children.get(index).copied()
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.data(id).parent
    }

    /// Position of `id` among its parent's children; 0 for parentless
    /// objects. This is the "natural order of the scene tree" used as the
    /// analyzer's selection sort key.
    pub fn child_index(&self, id: ObjectId) -> usize {
        match self.data(id).parent {
            Some(parent) => self
                .data(parent)
                .children
                .iter()
                .position(|c| *c == id)
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Move `child` under `parent` (or detach it when `parent` is `None`).
    ///
    /// The child is removed from its previous parent first and appended to
    /// the new parent's child list.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> Result<()> {
        if let Some(new_parent) = parent {
            // Walk up from the new parent; attaching to self or to a
            // descendant would disconnect the subtree.
            let mut cursor = Some(new_parent);
            while let Some(id) = cursor {
                if id == child {
                    return Err(Error::CircularReference);
                }
                cursor = self.data(id).parent;
            }
        }

        if let Some(old_parent) = self.data(child).parent {
            let siblings = &mut self.data_mut(old_parent).children;
            if let Some(pos) = siblings.iter().position(|c| *c == child) {
                siblings.remove(pos);
            }
        }

        self.data_mut(child).parent = parent;
        if let Some(new_parent) = parent {
            self.data_mut(new_parent).children.push(child);
        }
        Ok(())
    }

    pub fn property(&self, id: ObjectId, name: &str) -> Option<&Value> {
        self.data(id).properties.get(name)
    }

    pub fn set_property(&mut self, id: ObjectId, name: impl Into<String>, value: Value) {
        self.data_mut(id).properties.insert(name.into(), value);
    }

    /// Properties in name order.
    pub fn properties(&self, id: ObjectId) -> impl Iterator<Item = (&str, &Value)> {
        self.data(id)
            .properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn property_count(&self, id: ObjectId) -> usize {
        self.data(id).properties.len()
    }
}
