//! Selection of items from one source object

use crate::tree::ObjectId;

/// A subset of one object's children and/or properties.
///
/// Children are addressed by index into the object's child list,
/// properties by name. Produced by out-patterns, consumed by out-filters
/// and by `Format::encode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The source object the indices and names refer to.
    pub object: ObjectId,
    /// Selected child indices.
    pub children: Vec<usize>,
    /// Selected property names.
    pub properties: Vec<String>,
}

impl Selection {
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            children: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn with_children(object: ObjectId, children: Vec<usize>) -> Self {
        Self {
            object,
            children,
            properties: Vec::new(),
        }
    }

    pub fn with_properties(object: ObjectId, properties: Vec<String>) -> Self {
        Self {
            object,
            children: Vec::new(),
            properties,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.properties.is_empty()
    }
}
