//! Well-known repository filesystem names.

use std::path::Path;

/// Standard repository markers and metadata files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoFile {
    /// The `.rbxfs` directory marking a repository root
    MetaDir,
    /// The project-level rule file inside `.rbxfs`
    Rules,
    /// The serialized class catalog inside `.rbxfs`
    Services,
    /// The per-directory object sidecar
    Sidecar,
}

impl RepoFile {
    /// Get the string representation of the name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaDir => ".rbxfs",
            Self::Rules => "rules",
            Self::Services => "services",
            Self::Sidecar => "data",
        }
    }
}

impl AsRef<Path> for RepoFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for RepoFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for RepoFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
