//! Scene tree data model for rbxfs
//!
//! Provides the place-scoped object arena, the typed property value sum
//! type, selection descriptors shared by planners and codecs, the class
//! ontology, and the per-place referent table.

pub mod error;
pub mod ontology;
pub mod referent;
pub mod selection;
pub mod tree;
pub mod value;

pub use error::{Error, Result};
pub use ontology::ClassCatalog;
pub use referent::{PropRef, RefTable};
pub use selection::Selection;
pub use tree::{ObjectId, Tree};
pub use value::Value;
