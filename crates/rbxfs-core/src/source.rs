//! Source cache for sync-in
//!
//! Memoizes the decoded content of repository files for one sync
//! invocation. However many in-rules touch a path, its file is decoded at
//! most once.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use rbxfs_format::{Error as FormatError, Format as _, Source};
use rbxfs_fs::Error as FsError;
use rbxfs_tree::{RefTable, Tree};

use crate::error::Result;
use crate::sidecar::Sidecar;

/// A cached decode result.
#[derive(Debug)]
pub struct SourceEntry {
    pub is_dir: bool,
    pub source: Source,
}

/// Path-keyed cache of decoded sources for one place directory.
#[derive(Debug)]
pub struct SourceCache {
    root: PathBuf,
    entries: std::collections::BTreeMap<String, SourceEntry>,
}

/// A pattern-selected file paired with its cached source.
#[derive(Debug)]
pub struct SourceMap<'a> {
    /// File name the pattern matched, without directory.
    pub file: String,
    pub is_dir: bool,
    pub source: &'a Source,
}

impl SourceCache {
    /// A cache rooted at the place directory being synced in.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            entries: Default::default(),
        }
    }

    /// Absolute path of the place directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, rel: &str) -> Option<&SourceEntry> {
        self.entries.get(rel)
    }

    /// Decode `rel` if it is not already cached.
    ///
    /// Returns `Ok(None)` for a directory without a readable sidecar;
    /// such directories are skipped, not errors. Everything else either
    /// yields the cached entry or a decode error.
    pub fn ensure(
        &mut self,
        rel: &str,
        file_name: &str,
        tree: &mut Tree,
        refs: &mut RefTable,
    ) -> Result<Option<&SourceEntry>> {
        if self.entries.contains_key(rel) {
            return Ok(self.entries.get(rel));
        }

        let mut abs = self.root.clone();
        for segment in rel.split('/') {
            abs.push(segment);
        }

        let metadata = fs::metadata(&abs).map_err(|e| FsError::io(&abs, e))?;
        let entry = if metadata.is_dir() {
            let sidecar = match Sidecar::read(&abs) {
                Ok(sidecar) if !sidecar.class_name.is_empty() => sidecar,
                _ => {
                    warn!(path = %abs.display(), "skipping directory without readable sidecar");
                    return Ok(None);
                }
            };
            let id = tree.insert("");
            sidecar.apply(tree, id);
            refs.ensure_registered(tree, id);
            tree.set_name(id, file_name);
            SourceEntry {
                is_dir: true,
                source: Source::from_children(vec![id]),
            }
        } else {
            let ext = file_name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
            let format = rbxfs_format::from_extension(ext).ok_or(FormatError::Unsupported {
                ext: ext.to_string(),
            })?;
            let mut file = fs::File::open(&abs).map_err(|e| FsError::io(&abs, e))?;
            SourceEntry {
                is_dir: false,
                source: format.decode(tree, refs, &mut file)?,
            }
        };

        self.entries.insert(rel.to_string(), entry);
        Ok(self.entries.get(rel))
    }
}
