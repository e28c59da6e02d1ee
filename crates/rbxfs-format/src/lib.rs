//! Leaf and artifact codecs for rbxfs
//!
//! Every file the synchronizer reads or writes goes through a `Format`:
//! subtree documents (`rbxm`, `rbxmx`, `rbxl`, `rbxlx`), property bags
//! (`json`, `xml`), and raw single-property payloads (`bin`, `lua`,
//! `txt`). The engine selects formats by extension and interacts with
//! them only through the trait.

pub mod document;
pub mod error;
pub mod model;
pub mod props;
pub mod raw;
pub mod source;
mod xml;

use std::io::{Read, Write};

use rbxfs_tree::{RefTable, Selection, Tree};

pub use error::{Error, Result};
pub use source::Source;

/// A file format the synchronizer can read and write.
pub trait Format {
    /// Human-readable format name.
    fn name(&self) -> &'static str;

    /// Canonical file extension, without the dot.
    fn ext(&self) -> &'static str;

    /// Whether the selections can be encoded by this format.
    fn can_encode(&self, tree: &Tree, selections: &[Selection]) -> bool;

    /// Encode the selections into `writer`.
    fn encode(&self, tree: &Tree, selections: &[Selection], writer: &mut dyn Write)
        -> Result<()>;

    /// Decode `reader` into a source, allocating any objects into `tree`.
    fn decode(&self, tree: &mut Tree, refs: &mut RefTable, reader: &mut dyn Read)
        -> Result<Source>;
}

/// Look up a format by file extension (with or without a leading dot).
pub fn from_extension(ext: &str) -> Option<Box<dyn Format>> {
    match ext.trim_start_matches('.').to_lowercase().as_str() {
        "rbxm" => Some(Box::new(model::RBXM)),
        "rbxmx" => Some(Box::new(model::RBXMX)),
        "rbxl" => Some(Box::new(model::RBXL)),
        "rbxlx" => Some(Box::new(model::RBXLX)),
        "json" => Some(Box::new(props::JsonFormat)),
        "xml" => Some(Box::new(props::XmlBagFormat)),
        "bin" => Some(Box::new(raw::BIN)),
        "lua" => Some(Box::new(raw::LUA)),
        "txt" => Some(Box::new(raw::TXT)),
        _ => None,
    }
}

/// Look up a place/model artifact format; `None` for leaf-only extensions.
///
/// This is the capability predicate the sync drivers use to decide whether
/// a top-level file is a decodable artifact.
pub fn place_format(ext: &str) -> Option<Box<dyn Format>> {
    match ext.trim_start_matches('.').to_lowercase().as_str() {
        "rbxm" => Some(Box::new(model::RBXM)),
        "rbxmx" => Some(Box::new(model::RBXMX)),
        "rbxl" => Some(Box::new(model::RBXL)),
        "rbxlx" => Some(Box::new(model::RBXLX)),
        _ => None,
    }
}
