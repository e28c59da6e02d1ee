//! Property-bag formats
//!
//! `json` serializes the selected properties of one object as a name ->
//! `{type, value}` map. The `xml` property bag is recognized but not
//! implemented.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;

use rbxfs_tree::{RefTable, Selection, Tree, Value};

use crate::error::{Error, Result};
use crate::source::Source;
use crate::Format;

fn bag_can_encode(selections: &[Selection]) -> bool {
    match selections {
        [] => true,
        [only] => only.children.is_empty(),
        _ => false,
    }
}

/// JSON property bag.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn ext(&self) -> &'static str {
        "json"
    }

    fn can_encode(&self, _tree: &Tree, selections: &[Selection]) -> bool {
        bag_can_encode(selections)
    }

    fn encode(
        &self,
        tree: &Tree,
        selections: &[Selection],
        writer: &mut dyn Write,
    ) -> Result<()> {
        if !self.can_encode(tree, selections) {
            return Err(Error::Selection { format: self.name() });
        }

        let mut bag = serde_json::Map::new();
        if let Some(selection) = selections.first() {
            for name in &selection.properties {
                // A property may have been removed between selection and
                // encode; absent names are skipped.
                let Some(value) = tree.property(selection.object, name) else {
                    continue;
                };
                bag.insert(
                    name.clone(),
                    json!({
                        "type": value.type_name(),
                        "value": value_payload(value),
                    }),
                );
            }
        }

        serde_json::to_writer_pretty(&mut *writer, &serde_json::Value::Object(bag))
            .map_err(|e| Error::encode(self.name(), e.to_string()))?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn decode(
        &self,
        _tree: &mut Tree,
        _refs: &mut RefTable,
        reader: &mut dyn Read,
    ) -> Result<Source> {
        let parsed: serde_json::Value = serde_json::from_reader(reader)
            .map_err(|e| Error::decode(self.name(), e.to_string()))?;
        let serde_json::Value::Object(bag) = parsed else {
            return Err(Error::decode(self.name(), "expected a JSON object"));
        };

        let mut source = Source::default();
        for (name, entry) in bag {
            let type_name = entry
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| {
                    Error::decode(self.name(), format!("property `{name}` has no type"))
                })?;
            let payload = entry.get("value").unwrap_or(&serde_json::Value::Null);
            let value = value_from_payload(type_name, payload)
                .map_err(|message| Error::decode(self.name(), message))?;
            if matches!(value, Value::Reference(_)) {
                source.reference_props.insert(name.clone());
            }
            source.properties.insert(name, value);
        }
        Ok(source)
    }
}

/// XML property bag; recognized extension, unimplemented codec.
#[derive(Debug, Clone, Copy)]
pub struct XmlBagFormat;

impl Format for XmlBagFormat {
    fn name(&self) -> &'static str {
        "XML"
    }

    fn ext(&self) -> &'static str {
        "xml"
    }

    fn can_encode(&self, _tree: &Tree, selections: &[Selection]) -> bool {
        bag_can_encode(selections)
    }

    fn encode(&self, _tree: &Tree, _selections: &[Selection], _writer: &mut dyn Write) -> Result<()> {
        Err(Error::NotImplemented { format: self.name() })
    }

    fn decode(
        &self,
        _tree: &mut Tree,
        _refs: &mut RefTable,
        _reader: &mut dyn Read,
    ) -> Result<Source> {
        Err(Error::NotImplemented { format: self.name() })
    }
}

fn value_payload(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) | Value::ProtectedString(s) | Value::Reference(s) => json!(s),
        Value::BinaryString(bytes) => json!(BASE64.encode(bytes)),
        Value::Bool(b) => json!(b),
        Value::Int32(n) => json!(n),
        Value::Int64(n) => json!(n),
        Value::Float32(f) => json!(f),
        Value::Float64(f) => json!(f),
        Value::Vector3([x, y, z]) => json!([x, y, z]),
    }
}

fn value_from_payload(
    type_name: &str,
    payload: &serde_json::Value,
) -> std::result::Result<Value, String> {
    let want_str = || {
        payload
            .as_str()
            .ok_or_else(|| format!("{type_name} payload must be a string"))
    };
    Ok(match type_name {
        "String" => Value::String(want_str()?.to_string()),
        "ProtectedString" => Value::ProtectedString(want_str()?.to_string()),
        "Reference" => Value::Reference(want_str()?.to_string()),
        "BinaryString" => Value::BinaryString(
            BASE64
                .decode(want_str()?.as_bytes())
                .map_err(|e| format!("bad BinaryString payload: {e}"))?,
        ),
        "Bool" => Value::Bool(
            payload
                .as_bool()
                .ok_or_else(|| "Bool payload must be a boolean".to_string())?,
        ),
        "Int32" => Value::Int32(
            payload
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| "Int32 payload out of range".to_string())?,
        ),
        "Int64" => Value::Int64(
            payload
                .as_i64()
                .ok_or_else(|| "Int64 payload must be an integer".to_string())?,
        ),
        "Float32" => Value::Float32(
            payload
                .as_f64()
                .ok_or_else(|| "Float32 payload must be a number".to_string())? as f32,
        ),
        "Float64" => Value::Float64(
            payload
                .as_f64()
                .ok_or_else(|| "Float64 payload must be a number".to_string())?,
        ),
        "Vector3" => {
            let coords = payload
                .as_array()
                .filter(|a| a.len() == 3)
                .ok_or_else(|| "Vector3 payload must be a 3-element array".to_string())?;
            let mut out = [0.0f64; 3];
            for (slot, coord) in out.iter_mut().zip(coords) {
                *slot = coord
                    .as_f64()
                    .ok_or_else(|| "Vector3 coordinates must be numbers".to_string())?;
            }
            Value::Vector3(out)
        }
        other => return Err(format!("unknown value type `{other}`")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_encodes_typed_bag() {
        let mut tree = Tree::new();
        let obj = tree.insert("Part");
        tree.set_property(obj, "Anchored", Value::Bool(true));
        tree.set_property(obj, "Data", Value::BinaryString(vec![7, 8]));

        let selection = Selection::with_properties(
            obj,
            vec!["Anchored".into(), "Data".into(), "Missing".into()],
        );
        let mut bytes = Vec::new();
        JsonFormat.encode(&tree, &[selection], &mut bytes).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["Anchored"]["type"], "Bool");
        assert_eq!(parsed["Anchored"]["value"], true);
        assert_eq!(parsed["Data"]["type"], "BinaryString");
        assert!(parsed.get("Missing").is_none());
    }

    #[test]
    fn test_json_decode_flags_references() {
        let text = r#"{
            "PrimaryPart": {"type": "Reference", "value": "RBX42"},
            "Name": {"type": "String", "value": "Model"}
        }"#;
        let mut tree = Tree::new();
        let mut refs = RefTable::new();
        let source = JsonFormat
            .decode(&mut tree, &mut refs, &mut text.as_bytes())
            .unwrap();

        assert!(source.reference_props.contains("PrimaryPart"));
        assert!(!source.reference_props.contains("Name"));
        assert_eq!(
            source.properties.get("PrimaryPart"),
            Some(&Value::Reference("RBX42".into()))
        );
    }

    #[test]
    fn test_json_rejects_child_selections() {
        let mut tree = Tree::new();
        let obj = tree.insert("Folder");
        let selection = Selection::with_children(obj, vec![0]);
        assert!(!JsonFormat.can_encode(&tree, &[selection]));
    }

    #[test]
    fn test_xml_bag_not_implemented() {
        let mut tree = Tree::new();
        let mut refs = RefTable::new();
        let err = XmlBagFormat
            .decode(&mut tree, &mut refs, &mut b"".as_slice())
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented { format: "XML" }));
    }
}
