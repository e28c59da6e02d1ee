//! XML carrier for subtree documents
//!
//! Reads and writes the `<rbxfs>` document schema:
//!
//! ```xml
//! <rbxfs version="1">
//!   <item class="Folder" referent="RBXA">
//!     <prop name="Name" type="String">Assets</prop>
//!     <item class="Part" referent="RBXB"/>
//!   </item>
//! </rbxfs>
//! ```
//!
//! The reader is a small pull parser restricted to this schema: elements,
//! double-quoted attributes, character data, comments, and an optional
//! XML declaration. Binary payloads travel as base64 text.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use rbxfs_tree::Value;

use crate::document::{Document, DocumentNode};

pub(crate) type XmlResult<T> = std::result::Result<T, String>;

// ---------------------------------------------------------------- writing

/// Render a document.
pub(crate) fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str("<rbxfs version=\"1\">\n");
    for item in &doc.items {
        write_item(&mut out, item, 1);
    }
    out.push_str("</rbxfs>\n");
    out
}

fn write_item(out: &mut String, node: &DocumentNode, depth: usize) {
    let pad = "  ".repeat(depth);
    let _ = write!(out, "{pad}<item class=\"{}\"", escape_attr(&node.class_name));
    if !node.referent.is_empty() {
        let _ = write!(out, " referent=\"{}\"", escape_attr(&node.referent));
    }
    if node.is_service {
        out.push_str(" service=\"true\"");
    }
    if node.properties.is_empty() && node.children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");

    for (name, value) in &node.properties {
        let (type_name, text) = value_text(value);
        let _ = writeln!(
            out,
            "{pad}  <prop name=\"{}\" type=\"{type_name}\">{}</prop>",
            escape_attr(name),
            escape_text(&text),
        );
    }
    for child in &node.children {
        write_item(out, child, depth + 1);
    }
    let _ = writeln!(out, "{pad}</item>");
}

fn value_text(value: &Value) -> (&'static str, String) {
    let text = match value {
        Value::String(s) | Value::ProtectedString(s) | Value::Reference(s) => s.clone(),
        Value::BinaryString(bytes) => BASE64.encode(bytes),
        Value::Bool(b) => b.to_string(),
        Value::Int32(n) => n.to_string(),
        Value::Int64(n) => n.to_string(),
        Value::Float32(f) => f.to_string(),
        Value::Float64(f) => f.to_string(),
        Value::Vector3([x, y, z]) => format!("{x} {y} {z}"),
    };
    (value.type_name(), text)
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------- reading

#[derive(Debug, PartialEq)]
enum Event {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
    Text(String),
    Eof,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn next_event(&mut self) -> XmlResult<Event> {
        if self.pos >= self.bytes.len() {
            return Ok(Event::Eof);
        }
        if self.bytes[self.pos] != b'<' {
            return self.read_text();
        }
        if self.rest().starts_with(b"<?") {
            self.skip_until(b"?>")?;
            return self.next_event();
        }
        if self.rest().starts_with(b"<!--") {
            self.skip_until(b"-->")?;
            return self.next_event();
        }
        if self.rest().starts_with(b"</") {
            self.pos += 2;
            let name = self.read_name()?;
            self.skip_whitespace();
            self.expect(b'>')?;
            return Ok(Event::Close(name));
        }
        self.pos += 1;
        let name = self.read_name()?;
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(Event::Open {
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some(b'/') => {
                    self.pos += 1;
                    self.expect(b'>')?;
                    return Ok(Event::Open {
                        name,
                        attrs,
                        self_closing: true,
                    });
                }
                Some(_) => {
                    let attr_name = self.read_name()?;
                    self.skip_whitespace();
                    self.expect(b'=')?;
                    self.skip_whitespace();
                    self.expect(b'"')?;
                    let start = self.pos;
                    while self.peek() != Some(b'"') {
                        if self.pos >= self.bytes.len() {
                            return Err("unterminated attribute value".into());
                        }
                        self.pos += 1;
                    }
                    let raw = std::str::from_utf8(&self.bytes[start..self.pos])
                        .map_err(|e| e.to_string())?;
                    self.pos += 1;
                    attrs.push((attr_name, unescape(raw)?));
                }
                None => return Err("unterminated tag".into()),
            }
        }
    }

    fn read_text(&mut self) -> XmlResult<Event> {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'<' {
            self.pos += 1;
        }
        let raw = std::str::from_utf8(&self.bytes[start..self.pos]).map_err(|e| e.to_string())?;
        Ok(Event::Text(unescape(raw)?))
    }

    fn read_name(&mut self) -> XmlResult<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err("expected a name".into());
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> XmlResult<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!("expected `{}`", byte as char))
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn skip_until(&mut self, marker: &[u8]) -> XmlResult<()> {
        while self.pos < self.bytes.len() {
            if self.rest().starts_with(marker) {
                self.pos += marker.len();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(format!(
            "unterminated construct, expected `{}`",
            String::from_utf8_lossy(marker)
        ))
    }
}

fn unescape(text: &str) -> XmlResult<String> {
    if !text.contains('&') {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let end = rest
            .find(';')
            .ok_or_else(|| "unterminated entity".to_string())?;
        match &rest[..=end] {
            "&amp;" => out.push('&'),
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&quot;" => out.push('"'),
            "&apos;" => out.push('\''),
            other => return Err(format!("unknown entity `{other}`")),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Parse a rendered document.
pub(crate) fn parse_document(input: &str) -> XmlResult<Document> {
    let mut reader = Reader::new(input);
    loop {
        match reader.next_event()? {
            Event::Open { name, .. } if name == "rbxfs" => break,
            Event::Text(text) if text.trim().is_empty() => continue,
            other => return Err(format!("expected <rbxfs> root, got {other:?}")),
        }
    }

    let mut items = Vec::new();
    loop {
        match reader.next_event()? {
            Event::Open {
                name,
                attrs,
                self_closing,
            } if name == "item" => {
                items.push(parse_item(&mut reader, attrs, self_closing)?);
            }
            Event::Close(name) if name == "rbxfs" => break,
            Event::Text(text) if text.trim().is_empty() => continue,
            Event::Eof => return Err("unexpected end of document".into()),
            other => return Err(format!("unexpected content in <rbxfs>: {other:?}")),
        }
    }
    Ok(Document { items })
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn parse_item(
    reader: &mut Reader<'_>,
    attrs: Vec<(String, String)>,
    self_closing: bool,
) -> XmlResult<DocumentNode> {
    let mut node = DocumentNode {
        class_name: attr(&attrs, "class").unwrap_or_default().to_string(),
        referent: attr(&attrs, "referent").unwrap_or_default().to_string(),
        is_service: attr(&attrs, "service") == Some("true"),
        properties: Default::default(),
        children: Vec::new(),
    };
    if self_closing {
        return Ok(node);
    }

    loop {
        match reader.next_event()? {
            Event::Open {
                name,
                attrs,
                self_closing,
            } if name == "prop" => {
                let prop_name = attr(&attrs, "name")
                    .ok_or_else(|| "prop without name".to_string())?
                    .to_string();
                let type_name = attr(&attrs, "type")
                    .ok_or_else(|| "prop without type".to_string())?
                    .to_string();
                let text = if self_closing {
                    String::new()
                } else {
                    read_prop_text(reader)?
                };
                node.properties
                    .insert(prop_name, parse_value(&type_name, &text)?);
            }
            Event::Open {
                name,
                attrs,
                self_closing,
            } if name == "item" => {
                node.children.push(parse_item(reader, attrs, self_closing)?);
            }
            Event::Close(name) if name == "item" => return Ok(node),
            Event::Text(text) if text.trim().is_empty() => continue,
            Event::Eof => return Err("unexpected end of document in <item>".into()),
            other => return Err(format!("unexpected content in <item>: {other:?}")),
        }
    }
}

fn read_prop_text(reader: &mut Reader<'_>) -> XmlResult<String> {
    let mut text = String::new();
    loop {
        match reader.next_event()? {
            Event::Text(t) => text.push_str(&t),
            Event::Close(name) if name == "prop" => return Ok(text),
            Event::Eof => return Err("unexpected end of document in <prop>".into()),
            other => return Err(format!("unexpected content in <prop>: {other:?}")),
        }
    }
}

fn parse_value(type_name: &str, text: &str) -> XmlResult<Value> {
    let parse_err = |e: &dyn std::fmt::Display| format!("bad {type_name} value: {e}");
    Ok(match type_name {
        "String" => Value::String(text.to_string()),
        "ProtectedString" => Value::ProtectedString(text.to_string()),
        "Reference" => Value::Reference(text.to_string()),
        "BinaryString" => Value::BinaryString(
            BASE64
                .decode(text.trim().as_bytes())
                .map_err(|e| parse_err(&e))?,
        ),
        "Bool" => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => return Err(format!("bad Bool value: `{other}`")),
        },
        "Int32" => Value::Int32(text.trim().parse().map_err(|e| parse_err(&e))?),
        "Int64" => Value::Int64(text.trim().parse().map_err(|e| parse_err(&e))?),
        "Float32" => Value::Float32(text.trim().parse().map_err(|e| parse_err(&e))?),
        "Float64" => Value::Float64(text.trim().parse().map_err(|e| parse_err(&e))?),
        "Vector3" => {
            let parts: Vec<&str> = text.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(format!("bad Vector3 value: `{text}`"));
            }
            let mut coords = [0.0f64; 3];
            for (slot, part) in coords.iter_mut().zip(&parts) {
                *slot = part.parse().map_err(|e: std::num::ParseFloatError| parse_err(&e))?;
            }
            Value::Vector3(coords)
        }
        other => return Err(format!("unknown value type `{other}`")),
    })
}
