//! Raw single-property payload formats
//!
//! `bin`, `lua`, and `txt` each carry exactly one property value of a
//! fixed type as the file's whole content.

use std::io::{Read, Write};

use rbxfs_tree::{RefTable, Selection, Tree, Value};

use crate::error::{Error, Result};
use crate::source::Source;
use crate::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    /// `bin`: raw bytes of a BinaryString
    Binary,
    /// `lua`: UTF-8 text of a ProtectedString
    Script,
    /// `txt`: UTF-8 text of a String
    Text,
}

/// A whole-file single-property format.
#[derive(Debug, Clone, Copy)]
pub struct RawFormat {
    name: &'static str,
    ext: &'static str,
    payload: Payload,
}

pub const BIN: RawFormat = RawFormat {
    name: "Bin",
    ext: "bin",
    payload: Payload::Binary,
};

pub const LUA: RawFormat = RawFormat {
    name: "Lua",
    ext: "lua",
    payload: Payload::Script,
};

pub const TXT: RawFormat = RawFormat {
    name: "Text",
    ext: "txt",
    payload: Payload::Text,
};

impl RawFormat {
    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self.payload, value),
            (Payload::Binary, Value::BinaryString(_))
                | (Payload::Script, Value::ProtectedString(_))
                | (Payload::Text, Value::String(_))
        )
    }
}

impl Format for RawFormat {
    fn name(&self) -> &'static str {
        self.name
    }

    fn ext(&self) -> &'static str {
        self.ext
    }

    fn can_encode(&self, tree: &Tree, selections: &[Selection]) -> bool {
        let [selection] = selections else {
            return false;
        };
        if !selection.children.is_empty() || selection.properties.len() != 1 {
            return false;
        }
        tree.property(selection.object, &selection.properties[0])
            .map(|value| self.matches(value))
            .unwrap_or(false)
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
        let selection = &selections[0];
        let value = tree
            .property(selection.object, &selection.properties[0])
            .ok_or(Error::Selection { format: self.name })?;
        let bytes: &[u8] = match value {
            Value::BinaryString(bytes) => bytes,
            Value::ProtectedString(text) | Value::String(text) => text.as_bytes(),
            _ => return Err(Error::Selection { format: self.name }),
        };
        writer.write_all(bytes)?;
        Ok(())
    }

    fn decode(
        &self,
        _tree: &mut Tree,
        _refs: &mut RefTable,
        reader: &mut dyn Read,
    ) -> Result<Source> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let value = match self.payload {
            Payload::Binary => Value::BinaryString(data),
            Payload::Script => Value::ProtectedString(
                String::from_utf8(data)
                    .map_err(|e| Error::decode(self.name, e.to_string()))?,
            ),
            Payload::Text => Value::String(
                String::from_utf8(data)
                    .map_err(|e| Error::decode(self.name, e.to_string()))?,
            ),
        };
        Ok(Source::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lua_encodes_protected_string() {
        let mut tree = Tree::new();
        let script = tree.insert("Script");
        tree.set_property(script, "Source", Value::ProtectedString("print(1)".into()));

        let selection = Selection::with_properties(script, vec!["Source".into()]);
        let mut bytes = Vec::new();
        LUA.encode(&tree, &[selection], &mut bytes).unwrap();
        assert_eq!(bytes, b"print(1)");
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut tree = Tree::new();
        let part = tree.insert("Part");
        tree.set_property(part, "Name", Value::String("Brick".into()));

        let selection = Selection::with_properties(part, vec!["Name".into()]);
        assert!(!LUA.can_encode(&tree, &[selection.clone()]));
        assert!(TXT.can_encode(&tree, &[selection.clone()]));

        let mut bytes = Vec::new();
        let err = BIN.encode(&tree, &[selection], &mut bytes).unwrap_err();
        assert!(matches!(err, Error::Selection { format: "Bin" }));
    }

    #[test]
    fn test_bin_decodes_to_unnamed_value() {
        let mut tree = Tree::new();
        let mut refs = RefTable::new();
        let source = BIN
            .decode(&mut tree, &mut refs, &mut [0u8, 159, 146].as_slice())
            .unwrap();
        assert_eq!(source.values, vec![Value::BinaryString(vec![0, 159, 146])]);
        assert!(source.children.is_empty());
    }

    #[test]
    fn test_txt_requires_utf8() {
        let mut tree = Tree::new();
        let mut refs = RefTable::new();
        let err = TXT
            .decode(&mut tree, &mut refs, &mut [0xffu8, 0xfe].as_slice())
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
