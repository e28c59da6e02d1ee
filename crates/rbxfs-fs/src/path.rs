//! Relative path segments for planned actions
//!
//! Action paths are lists of directory names relative to a place's output
//! root. Analyzer orderings are defined over the joined forward-slash
//! string, so that sort key is available directly.

use std::path::{Path, PathBuf};

/// A relative path as an ordered list of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    /// The empty path (a place's output root).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// This path extended with one more segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// The first `len` segments of this path.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Forward-slash joined form; the total ordering the analyzers sort by.
    pub fn join_str(&self) -> String {
        self.segments.join("/")
    }

    /// Joined form of this path plus a trailing file name. An empty file
    /// name (the ignore sentinel) yields just the directory path.
    pub fn file_path(&self, file: &str) -> String {
        if file.is_empty() {
            self.join_str()
        } else if self.segments.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.join_str(), file)
        }
    }

    /// Resolve against a native base directory for I/O.
    pub fn to_native(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl std::fmt::Display for RelPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.join_str())
    }
}

impl From<&[&str]> for RelPath {
    fn from(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Whether `name` is acceptable as a file or directory name produced by a
/// sync: 1..=255 bytes, not `.` or `..`, characters in `[A-Za-z0-9._-]`.
pub fn is_valid_file_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 || name == "." || name == ".." {
        return false;
    }
    name.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_file_path() {
        let path = RelPath::from(["Workspace", "Model"].as_slice());
        assert_eq!(path.join_str(), "Workspace/Model");
        assert_eq!(path.file_path("Part.rbxm"), "Workspace/Model/Part.rbxm");
        assert_eq!(path.file_path(""), "Workspace/Model");
        assert_eq!(RelPath::root().file_path("a.json"), "a.json");
    }

    #[test]
    fn test_prefix() {
        let path = RelPath::from(["a", "b", "c"].as_slice());
        assert_eq!(path.prefix(1).join_str(), "a");
        assert_eq!(path.prefix(2).join_str(), "a/b");
        assert_eq!(path.prefix(9).join_str(), "a/b/c");
    }

    #[test]
    fn test_valid_file_names() {
        assert!(is_valid_file_name("Part.rbxm"));
        assert!(is_valid_file_name("a-b_c.1"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("."));
        assert!(!is_valid_file_name(".."));
        assert!(!is_valid_file_name("has space"));
        assert!(!is_valid_file_name("slash/name"));
        assert!(!is_valid_file_name(&"x".repeat(256)));
    }
}
