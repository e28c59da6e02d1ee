//! Repository layout discovery
//!
//! A directory is a repository iff it contains a `.rbxfs/` subdirectory.
//! Top-level place artifacts sync to same-named directories beside them.

use std::path::{Path, PathBuf};

use crate::constants::RepoFile;
use crate::error::Result;
use crate::io::read_dir_sorted;

/// Extensions of place/model artifacts at the repository top level.
pub const PLACE_EXTENSIONS: [&str; 4] = ["rbxl", "rbxlx", "rbxm", "rbxmx"];

/// Whether `root` is an rbxfs repository.
pub fn is_repository(root: &Path) -> bool {
    root.join(RepoFile::MetaDir.as_str()).is_dir()
}

/// Path of the project-level rule file.
pub fn project_rules_path(root: &Path) -> PathBuf {
    root.join(RepoFile::MetaDir.as_str())
        .join(RepoFile::Rules.as_str())
}

/// Path of the serialized class catalog.
pub fn services_path(root: &Path) -> PathBuf {
    root.join(RepoFile::MetaDir.as_str())
        .join(RepoFile::Services.as_str())
}

/// Path of the user-global rule file, if the host configured one.
///
/// Resolution of the OS user-data directory is host-specific; the
/// `RBXFS_GLOBAL_RULES` environment variable names the file directly.
pub fn global_rules_path() -> Option<PathBuf> {
    std::env::var_os("RBXFS_GLOBAL_RULES").map(PathBuf::from)
}

/// Top-level place artifacts, sorted by name.
pub fn places_in_repo(root: &Path) -> Result<Vec<String>> {
    let mut places = Vec::new();
    for entry in read_dir_sorted(root)? {
        if entry.is_dir {
            continue;
        }
        let ext = entry.name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
        if PLACE_EXTENSIONS.contains(&ext) {
            places.push(entry.name);
        }
    }
    Ok(places)
}

/// Top-level place directories, sorted by name. The metadata directory and
/// other dot-directories are not place directories.
pub fn dirs_in_repo(root: &Path) -> Result<Vec<String>> {
    let mut dirs = Vec::new();
    for entry in read_dir_sorted(root)? {
        if entry.is_dir && !entry.name.starts_with('.') {
            dirs.push(entry.name);
        }
    }
    Ok(dirs)
}

/// The output directory name for a place artifact: `foo.rbxl` -> `foo`.
pub fn place_dir(place: &str) -> String {
    match place.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => place.to_string(),
    }
}

/// The place artifact name reconstructed from a directory: `foo` -> `foo.rbxl`.
pub fn dir_place(dir: &str) -> String {
    format!("{dir}.rbxl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".rbxfs")).unwrap();
        temp
    }

    #[test]
    fn test_is_repository() {
        let temp = repo();
        assert!(is_repository(temp.path()));

        let bare = TempDir::new().unwrap();
        assert!(!is_repository(bare.path()));
    }

    #[test]
    fn test_places_in_repo_filters_extensions() {
        let temp = repo();
        fs::write(temp.path().join("world.rbxl"), b"").unwrap();
        fs::write(temp.path().join("model.rbxmx"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(temp.path().join("world")).unwrap();

        let places = places_in_repo(temp.path()).unwrap();
        assert_eq!(places, vec!["model.rbxmx", "world.rbxl"]);
    }

    #[test]
    fn test_dirs_in_repo_skips_meta() {
        let temp = repo();
        fs::create_dir(temp.path().join("world")).unwrap();
        fs::create_dir(temp.path().join("assets")).unwrap();
        fs::write(temp.path().join("world.rbxl"), b"").unwrap();

        let dirs = dirs_in_repo(temp.path()).unwrap();
        assert_eq!(dirs, vec!["assets", "world"]);
    }

    #[test]
    fn test_place_dir_naming() {
        assert_eq!(place_dir("world.rbxl"), "world");
        assert_eq!(place_dir("model.v2.rbxmx"), "model.v2");
        assert_eq!(dir_place("world"), "world.rbxl");
    }
}
