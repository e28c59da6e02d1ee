//! Model and place document formats
//!
//! `rbxm`/`rbxl` carry the binary document flavor, `rbxmx`/`rbxlx` the XML
//! flavor. All four accept child-only selections and decode to a source of
//! children.

use std::io::{Read, Write};

use rbxfs_tree::{RefTable, Selection, Tree};

use crate::document::{Document, BINARY_MAGIC, BINARY_VERSION};
use crate::error::{Error, Result};
use crate::source::Source;
use crate::xml;
use crate::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Binary,
    Xml,
}

/// A subtree document format.
#[derive(Debug, Clone, Copy)]
pub struct ModelFormat {
    name: &'static str,
    ext: &'static str,
    flavor: Flavor,
}

/// Binary model subtree.
pub const RBXM: ModelFormat = ModelFormat {
    name: "RBXM",
    ext: "rbxm",
    flavor: Flavor::Binary,
};

/// XML model subtree.
pub const RBXMX: ModelFormat = ModelFormat {
    name: "RBXMX",
    ext: "rbxmx",
    flavor: Flavor::Xml,
};

/// Binary place.
pub const RBXL: ModelFormat = ModelFormat {
    name: "RBXL",
    ext: "rbxl",
    flavor: Flavor::Binary,
};

/// XML place.
pub const RBXLX: ModelFormat = ModelFormat {
    name: "RBXLX",
    ext: "rbxlx",
    flavor: Flavor::Xml,
};

impl Format for ModelFormat {
    fn name(&self) -> &'static str {
        self.name
    }

    fn ext(&self) -> &'static str {
        self.ext
    }

    fn can_encode(&self, _tree: &Tree, selections: &[Selection]) -> bool {
        selections.iter().all(|s| s.properties.is_empty())
    }

    fn encode(
        &self,
        tree: &Tree,
        selections: &[Selection],
        writer: &mut dyn Write,
    ) -> Result<()> {
        if !self.can_encode(tree, selections) {
            return Err(Error::Selection { format: self.name });
        }
        let doc = Document::from_tree(tree, selections, self.name)?;
        match self.flavor {
            Flavor::Binary => {
                writer.write_all(BINARY_MAGIC)?;
                writer.write_all(&[BINARY_VERSION])?;
                bincode::serialize_into(writer, &doc)
                    .map_err(|e| Error::encode(self.name, e.to_string()))
            }
            Flavor::Xml => {
                let text = xml::write_document(&doc);
                writer.write_all(text.as_bytes())?;
                Ok(())
            }
        }
    }

    fn decode(
        &self,
        tree: &mut Tree,
        refs: &mut RefTable,
        reader: &mut dyn Read,
    ) -> Result<Source> {
        let doc = match self.flavor {
            Flavor::Binary => {
                let mut header = [0u8; 7];
                reader
                    .read_exact(&mut header)
                    .map_err(|e| Error::decode(self.name, e.to_string()))?;
                if &header[..6] != BINARY_MAGIC {
                    return Err(Error::decode(self.name, "bad magic"));
                }
                if header[6] != BINARY_VERSION {
                    return Err(Error::decode(
                        self.name,
                        format!("unsupported document version {}", header[6]),
                    ));
                }
                bincode::deserialize_from(reader)
                    .map_err(|e| Error::decode(self.name, e.to_string()))?
            }
            Flavor::Xml => {
                let mut text = String::new();
                reader
                    .read_to_string(&mut text)
                    .map_err(|e| Error::decode(self.name, e.to_string()))?;
                xml::parse_document(&text).map_err(|e| Error::decode(self.name, e))?
            }
        };
        Ok(Source::from_children(doc.into_tree(tree, refs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbxfs_tree::Value;

    fn sample_tree() -> (Tree, rbxfs_tree::ObjectId) {
        let mut tree = Tree::new();
        let root = tree.insert("DataModel");
        let folder = tree.insert("Folder");
        tree.set_name(folder, "Assets");
        let script = tree.insert("Script");
        tree.set_name(script, "Main");
        tree.set_property(script, "Source", Value::ProtectedString("print()".into()));
        tree.set_parent(folder, Some(root)).unwrap();
        tree.set_parent(script, Some(folder)).unwrap();
        (tree, root)
    }

    #[test]
    fn test_binary_roundtrip() {
        let (tree, root) = sample_tree();
        let selection = Selection::with_children(root, vec![0]);

        let mut bytes = Vec::new();
        RBXM.encode(&tree, &[selection], &mut bytes).unwrap();
        assert!(bytes.starts_with(BINARY_MAGIC));

        let mut out_tree = Tree::new();
        let mut refs = RefTable::new();
        let source = RBXM
            .decode(&mut out_tree, &mut refs, &mut bytes.as_slice())
            .unwrap();
        assert_eq!(source.children.len(), 1);
        let folder = source.children[0];
        assert_eq!(out_tree.name(folder), "Assets");
        assert_eq!(out_tree.children(folder).len(), 1);
    }

    #[test]
    fn test_xml_roundtrip() {
        let (tree, root) = sample_tree();
        let selection = Selection::with_children(root, vec![0]);

        let mut bytes = Vec::new();
        RBXMX.encode(&tree, &[selection], &mut bytes).unwrap();

        let mut out_tree = Tree::new();
        let mut refs = RefTable::new();
        let source = RBXMX
            .decode(&mut out_tree, &mut refs, &mut bytes.as_slice())
            .unwrap();
        assert_eq!(source.children.len(), 1);
        let folder = source.children[0];
        let script = out_tree.children(folder)[0];
        assert_eq!(
            out_tree.property(script, "Source"),
            Some(&Value::ProtectedString("print()".into()))
        );
    }

    #[test]
    fn test_property_selection_rejected() {
        let (tree, root) = sample_tree();
        let selection = Selection::with_properties(root, vec!["Name".into()]);
        let mut bytes = Vec::new();
        let err = RBXM.encode(&tree, &[selection], &mut bytes).unwrap_err();
        assert!(matches!(err, Error::Selection { format: "RBXM" }));
    }

    #[test]
    fn test_binary_bad_magic_rejected() {
        let mut tree = Tree::new();
        let mut refs = RefTable::new();
        let err = RBXL
            .decode(&mut tree, &mut refs, &mut b"garbage".as_slice())
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
