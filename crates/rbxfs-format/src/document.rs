//! Subtree document schema shared by the model/place carriers
//!
//! A document is the serialized form of a forest of objects. The binary
//! flavor is a magic-prefixed bincode payload; the XML flavor is written
//! and read by the `xml` module. Both carry the same nodes.

use serde::{Deserialize, Serialize};

use rbxfs_tree::{ObjectId, RefTable, Selection, Tree, Value};

use crate::error::{Error, Result};

use std::collections::BTreeMap;

/// Magic prefix of binary documents.
pub(crate) const BINARY_MAGIC: &[u8; 6] = b"RBXFS\0";
/// Current binary document version.
pub(crate) const BINARY_VERSION: u8 = 1;

/// One serialized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DocumentNode {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub referent: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_service: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

/// A serialized forest of objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Document {
    pub items: Vec<DocumentNode>,
}

impl Document {
    /// Build a document from the selected children of each selection.
    ///
    /// Selections must be child-only; indices are bounds-checked against
    /// the source object.
    pub fn from_tree(
        tree: &Tree,
        selections: &[Selection],
        format: &'static str,
    ) -> Result<Self> {
        let mut items = Vec::new();
        for selection in selections {
            let max = tree.children(selection.object).len();
            for (index, &child) in selection.children.iter().enumerate() {
                let id = tree.child(selection.object, child).ok_or(Error::Bounds {
                    format,
                    kind: "child",
                    index,
                    value: child,
                    max,
                })?;
                items.push(node_from_tree(tree, id));
            }
        }
        Ok(Self { items })
    }

    /// Allocate the document's objects into `tree`, registering referents,
    /// and return the top-level ids in document order.
    pub fn into_tree(self, tree: &mut Tree, refs: &mut RefTable) -> Vec<ObjectId> {
        self.items
            .into_iter()
            .map(|node| node_into_tree(node, tree, refs))
            .collect()
    }
}

fn node_from_tree(tree: &Tree, id: ObjectId) -> DocumentNode {
    DocumentNode {
        class_name: tree.class_name(id).to_string(),
        referent: tree.referent(id).to_string(),
        is_service: tree.is_service(id),
        properties: tree
            .properties(id)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
        children: tree
            .children(id)
            .iter()
            .map(|&child| node_from_tree(tree, child))
            .collect(),
    }
}

fn node_into_tree(node: DocumentNode, tree: &mut Tree, refs: &mut RefTable) -> ObjectId {
    let id = tree.insert(node.class_name);
    tree.set_referent(id, node.referent);
    tree.set_service(id, node.is_service);
    for (name, value) in node.properties {
        tree.set_property(id, name, value);
    }
    refs.ensure_registered(tree, id);
    for child in node.children {
        let child_id = node_into_tree(child, tree, refs);
        // Fresh allocations have no prior parent; attaching cannot cycle.
        let _ = tree.set_parent(child_id, Some(id));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tree_checks_bounds() {
        let mut tree = Tree::new();
        let root = tree.insert("DataModel");
        let child = tree.insert("Folder");
        tree.set_parent(child, Some(root)).unwrap();

        let bad = Selection::with_children(root, vec![3]);
        let err = Document::from_tree(&tree, &[bad], "RBXM").unwrap_err();
        assert!(matches!(err, Error::Bounds { value: 3, max: 1, .. }));
    }

    #[test]
    fn test_document_roundtrip_through_tree() {
        let mut tree = Tree::new();
        let root = tree.insert("DataModel");
        let folder = tree.insert("Folder");
        tree.set_name(folder, "Assets");
        tree.set_referent(folder, "RBXA");
        let part = tree.insert("Part");
        tree.set_name(part, "Brick");
        tree.set_parent(folder, Some(root)).unwrap();
        tree.set_parent(part, Some(folder)).unwrap();

        let selection = Selection::with_children(root, vec![0]);
        let doc = Document::from_tree(&tree, &[selection], "RBXM").unwrap();

        let mut out_tree = Tree::new();
        let mut refs = RefTable::new();
        let ids = doc.into_tree(&mut out_tree, &mut refs);
        assert_eq!(ids.len(), 1);
        let out_folder = ids[0];
        assert_eq!(out_tree.class_name(out_folder), "Folder");
        assert_eq!(out_tree.name(out_folder), "Assets");
        assert_eq!(refs.lookup("RBXA"), Some(out_folder));
        let out_children = out_tree.children(out_folder);
        assert_eq!(out_children.len(), 1);
        assert_eq!(out_tree.name(out_children[0]), "Brick");
    }
}
