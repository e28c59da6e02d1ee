//! Error types for rbxfs-core

use std::path::PathBuf;

/// Result type for rbxfs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rbxfs-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The root lacks the `.rbxfs` metadata directory
    #[error("directory is not a repository: {path}")]
    NotRepository { path: PathBuf },

    /// Unknown function name, direction mismatch, or signature violation
    #[error("rule dispatch failed: {message}")]
    Dispatch { message: String },

    /// Pattern executor failure, carrying the originating rule
    #[error("pattern error in `{rule}`: {message}")]
    Pattern { rule: String, message: String },

    /// Filter executor failure, carrying the originating rule
    #[error("filter error in `{rule}`: {message}")]
    Filter { rule: String, message: String },

    /// Scene tree error from rbxfs-tree
    #[error(transparent)]
    Tree(#[from] rbxfs_tree::Error),

    /// Filesystem error from rbxfs-fs
    #[error(transparent)]
    Fs(#[from] rbxfs_fs::Error),

    /// Codec error from rbxfs-format
    #[error(transparent)]
    Format(#[from] rbxfs_format::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Errors tied to one file or planned action
    #[error(transparent)]
    File(#[from] FileErrors),

    /// Per-file error bundles accumulated across one invocation
    #[error("{}", render_aggregate(.0))]
    Aggregate(Vec<FileErrors>),
}

/// Errors collected for a single file, directory, or place.
#[derive(Debug)]
pub struct FileErrors {
    /// Repository-relative path the errors belong to
    pub path: String,
    /// What was being done, e.g. "decoding" or "syncing out"
    pub action: &'static str,
    pub errors: Vec<Error>,
}

impl FileErrors {
    pub fn new(path: impl Into<String>, action: &'static str) -> Self {
        Self {
            path: path.into(),
            action,
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn render(&self) -> String {
        match self.errors.as_slice() {
            [] => format!("no errors when {} `{}`", self.action, self.path),
            [only] => format!("error when {} `{}`: {}", self.action, self.path, only),
            many => format!("{} errors when {} `{}`", many.len(), self.action, self.path),
        }
    }
}

impl std::fmt::Display for FileErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl std::error::Error for FileErrors {}

fn render_aggregate(bundles: &[FileErrors]) -> String {
    match bundles {
        [] => "no errors".to_string(),
        [only] => only.render(),
        many => format!("one or more errors on {} files", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_errors_render() {
        let mut bundle = FileErrors::new("world.rbxl", "decoding");
        bundle.push(Error::Dispatch {
            message: "unknown pattern function `Chlid`".into(),
        });
        let text = bundle.to_string();
        assert!(text.contains("world.rbxl"), "got: {text}");
        assert!(text.contains("Chlid"), "got: {text}");

        bundle.push(Error::Dispatch {
            message: "another".into(),
        });
        assert!(bundle.to_string().starts_with("2 errors"), "got: {bundle}");
    }

    #[test]
    fn test_aggregate_render() {
        let bundles = vec![
            FileErrors::new("a", "decoding"),
            FileErrors::new("b", "decoding"),
        ];
        let error = Error::Aggregate(bundles);
        assert!(error.to_string().contains("2 files"));
    }
}
