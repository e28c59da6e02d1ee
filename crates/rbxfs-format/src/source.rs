//! Decoded file content

use std::collections::{BTreeMap, BTreeSet};

use rbxfs_tree::{ObjectId, Value};

/// The decoded content of one repository file or directory-as-object.
///
/// A model/place file yields `children`; a property bag yields
/// `properties` (with reference-typed entries flagged in
/// `reference_props`); a raw payload file yields one unnamed value in
/// `values`.
#[derive(Debug, Default)]
pub struct Source {
    /// Objects decoded into the place tree, in file order.
    pub children: Vec<ObjectId>,
    /// Named property values.
    pub properties: BTreeMap<String, Value>,
    /// Values not attached to any particular property.
    pub values: Vec<Value>,
    /// Property names whose values are unresolved references.
    pub reference_props: BTreeSet<String>,
}

impl Source {
    pub fn from_children(children: Vec<ObjectId>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            values: vec![value],
            ..Self::default()
        }
    }
}
