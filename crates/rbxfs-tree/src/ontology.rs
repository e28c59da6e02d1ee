//! Class ontology
//!
//! Answers the two queries the engine needs from the class dump: whether a
//! class inherits from another, and whether a class is a service. Persisted
//! as JSON in the repository's `.rbxfs/services` file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One class in the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Immediate superclass name, absent for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Whether objects of this class are services on the place root.
    #[serde(default)]
    pub service: bool,
}

/// Serialized class ontology.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassCatalog {
    #[serde(default)]
    classes: BTreeMap<String, ClassEntry>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Serialize the catalog to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Register a class. Used by tests and catalog construction tools.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        superclass: Option<&str>,
        service: bool,
    ) {
        self.classes.insert(
            name.into(),
            ClassEntry {
                superclass: superclass.map(str::to_string),
                service,
            },
        );
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Whether `class` equals `ancestor` or inherits from it.
    ///
    /// The walk only follows classes known to the catalog: an unknown
    /// starting class never matches, even by name.
    pub fn inherits(&self, class: &str, ancestor: &str) -> bool {
        let mut current = class;
        // The chain cannot be longer than the catalog itself; anything
        // beyond that is a superclass cycle in the input.
        for _ in 0..=self.classes.len() {
            let Some(entry) = self.classes.get(current) else {
                return false;
            };
            if current == ancestor {
                return true;
            }
            match entry.superclass.as_deref() {
                Some(superclass) => current = superclass,
                None => return false,
            }
        }
        false
    }

    /// Whether `class` is a known service class.
    pub fn is_service(&self, class: &str) -> bool {
        self.classes.get(class).map(|e| e.service).unwrap_or(false)
    }
}
