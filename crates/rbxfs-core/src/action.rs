//! Planned action types
//!
//! Planners emit flat lists of candidate actions; the analyzers
//! canonicalize them. `dir` is always relative to the place's output root.

use std::collections::BTreeMap;

use rbxfs_fs::RelPath;
use rbxfs_tree::Selection;

/// A file or directory a sync-out action produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDef {
    /// File name; empty is the "ignore" sentinel.
    pub name: String,
    pub is_dir: bool,
}

impl FileDef {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    /// The sentinel mapping that records items to ignore.
    pub fn ignore() -> Self {
        Self {
            name: String::new(),
            is_dir: false,
        }
    }

    pub fn is_ignore(&self) -> bool {
        self.name.is_empty()
    }
}

/// Associates selections with the file they are written to.
#[derive(Debug, Clone)]
pub struct OutMap {
    pub file: FileDef,
    pub selections: Vec<Selection>,
}

/// One candidate or canonical sync-out action.
#[derive(Debug, Clone)]
pub struct OutAction {
    /// Scope depth of the rule that produced this action.
    pub depth: u32,
    /// Directory containing the file, relative to the place output root.
    pub dir: RelPath,
    pub map: OutMap,
}

impl OutAction {
    /// The action's full relative path, including the file name.
    pub fn full_path(&self) -> String {
        self.dir.file_path(&self.map.file.name)
    }
}

/// One planned selection from a source file during sync-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InSelection {
    /// File name relative to the action's directory.
    pub file: String,
    /// Ignore the associated file.
    pub ignore: bool,
    /// Source children to adopt into the directory's object.
    pub children: Vec<usize>,
    /// Named source properties to copy onto the directory's object.
    pub properties: Vec<String>,
    /// `name -> k`: set property `name` to the source's k-th unnamed value.
    pub values: BTreeMap<String, usize>,
}

impl InSelection {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }
}

/// One candidate or canonical sync-in action.
#[derive(Debug, Clone)]
pub struct InAction {
    pub depth: u32,
    pub dir: RelPath,
    pub selections: Vec<InSelection>,
}
