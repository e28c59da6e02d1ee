//! Directory-as-object sidecar metadata
//!
//! Every directory that represents an object carries a `data` file with
//! the fields the directory name cannot: class, referent, service flag.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use rbxfs_fs::{io, Error as FsError, RepoFile};
use rbxfs_tree::{ObjectId, Tree};

use crate::error::Result;

/// Contents of a directory's `data` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub class_name: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub is_service: bool,
}

impl Sidecar {
    pub fn from_object(tree: &Tree, id: ObjectId) -> Self {
        Self {
            class_name: tree.class_name(id).to_string(),
            reference: tree.referent(id).to_string(),
            is_service: tree.is_service(id),
        }
    }

    /// Copy the sidecar fields onto an object.
    pub fn apply(&self, tree: &mut Tree, id: ObjectId) {
        tree.set_class_name(id, &self.class_name);
        tree.set_referent(id, &self.reference);
        tree.set_service(id, self.is_service);
    }

    /// Read the sidecar of the directory at `dir`.
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(RepoFile::Sidecar.as_str());
        let content = fs::read_to_string(&path).map_err(|e| FsError::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the sidecar into the directory at `dir`.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(RepoFile::Sidecar.as_str());
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        io::write_atomic(&path, content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_roundtrip() {
        let temp = TempDir::new().unwrap();

        let mut tree = Tree::new();
        let id = tree.insert("Workspace");
        tree.set_referent(id, "RBX7");
        tree.set_service(id, true);

        Sidecar::from_object(&tree, id).write(temp.path()).unwrap();
        let loaded = Sidecar::read(temp.path()).unwrap();
        assert_eq!(
            loaded,
            Sidecar {
                class_name: "Workspace".into(),
                reference: "RBX7".into(),
                is_service: true,
            }
        );

        let mut out_tree = Tree::new();
        let out = out_tree.insert("");
        loaded.apply(&mut out_tree, out);
        assert_eq!(out_tree.class_name(out), "Workspace");
        assert!(out_tree.is_service(out));
    }

    #[test]
    fn test_missing_sidecar_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(Sidecar::read(temp.path()).is_err());
    }
}
