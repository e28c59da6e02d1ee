//! End-to-end sync-out scenarios against real temp repositories

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use rbxfs_core::{sync_out, SyncOptions};
use rbxfs_format::Format as _;
use rbxfs_tree::{ObjectId, RefTable, Selection, Tree, Value};

fn create_repo(rules: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let meta = temp.path().join(".rbxfs");
    fs::create_dir(&meta).unwrap();
    fs::write(meta.join("rules"), rules).unwrap();
    temp
}

fn write_place(repo: &Path, name: &str, tree: &Tree, root: ObjectId) {
    let selection =
        Selection::with_children(root, (0..tree.children(root).len()).collect());
    let mut bytes = Vec::new();
    rbxfs_format::model::RBXL
        .encode(tree, &[selection], &mut bytes)
        .unwrap();
    fs::write(repo.join(name), bytes).unwrap();
}

fn child(tree: &mut Tree, parent: ObjectId, class: &str, name: &str) -> ObjectId {
    let id = tree.insert(class);
    tree.set_name(id, name);
    tree.set_parent(id, Some(parent)).unwrap();
    id
}

/// Every file under `dir`, relative path -> bytes.
fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fn visit(base: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                visit(base, &path, out);
            } else {
                let rel = path
                    .strip_prefix(base)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    if dir.exists() {
        visit(dir, dir, &mut out);
    }
    out
}

#[test]
fn ignore_everything_produces_only_the_place_root() {
    let repo = create_repo("out Child(*) : Ignore()\n");
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    child(&mut tree, root, "Folder", "C");
    write_place(repo.path(), "world.rbxl", &tree, root);

    let report = sync_out(repo.path(), &SyncOptions::default()).unwrap();
    assert!(report.success);

    let out_dir = repo.path().join("world");
    assert!(out_dir.is_dir());
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0, "no files expected");
}

#[test]
fn flat_file_mapping_collects_all_children() {
    let repo = create_repo("out Child(*) : File(children.rbxmx)\n");
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    child(&mut tree, root, "Folder", "A");
    child(&mut tree, root, "Folder", "B");
    write_place(repo.path(), "world.rbxl", &tree, root);

    sync_out(repo.path(), &SyncOptions::default()).unwrap();

    let files = snapshot(&repo.path().join("world"));
    assert_eq!(
        files.keys().collect::<Vec<_>>(),
        vec!["children.rbxmx"],
        "exactly one file, no subdirectories"
    );

    let mut decoded = Tree::new();
    let mut refs = RefTable::new();
    let source = rbxfs_format::model::RBXMX
        .decode(
            &mut decoded,
            &mut refs,
            &mut files["children.rbxmx"].as_slice(),
        )
        .unwrap();
    let names: Vec<&str> = source
        .children
        .iter()
        .map(|&id| decoded.name(id))
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn directory_cascade_exposes_only_the_current_objects_properties() {
    let repo = create_repo(
        "out Child(Folder) : Directory()\n\
         out Property(*, Source, ProtectedString) : PropertyName(lua)\n",
    );
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    let folder = child(&mut tree, root, "Folder", "Folder1");
    let script = child(&mut tree, folder, "Script", "Script1");
    tree.set_property(script, "Source", Value::ProtectedString("print()".into()));
    write_place(repo.path(), "world.rbxl", &tree, root);

    sync_out(repo.path(), &SyncOptions::default()).unwrap();

    let out_dir = repo.path().join("world");
    assert!(out_dir.join("Folder1").is_dir());
    assert!(out_dir.join("Folder1").join("data").is_file());
    // Script1 is not itself a directory, so its Source is never reached.
    assert!(!out_dir.join("Folder1").join("Script1.lua").exists());
    assert!(!out_dir.join("Folder1").join("Source.lua").exists());

    let sidecar: serde_json::Value =
        serde_json::from_slice(&fs::read(out_dir.join("Folder1").join("data")).unwrap())
            .unwrap();
    assert_eq!(sidecar["class_name"], "Folder");
}

#[test]
fn script_directory_rule_reaches_nested_source() {
    // With Script objects also mapped to directories, the Source property
    // lands inside the script's own directory.
    let repo = create_repo(
        "out Child(*) : Directory()\n\
         out Property(*, Source, ProtectedString) : PropertyName(lua)\n",
    );
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    let folder = child(&mut tree, root, "Folder", "Folder1");
    let script = child(&mut tree, folder, "Script", "Script1");
    tree.set_property(script, "Source", Value::ProtectedString("print()".into()));
    write_place(repo.path(), "world.rbxl", &tree, root);

    sync_out(repo.path(), &SyncOptions::default()).unwrap();

    let script_dir = repo.path().join("world").join("Folder1").join("Script1");
    assert!(script_dir.is_dir());
    assert_eq!(
        fs::read(script_dir.join("Source.lua")).unwrap(),
        b"print()"
    );
}

#[test]
fn conflicting_directory_claims_drop_the_whole_subtree() {
    // Folder "Shared" and Model "Shared" both claim the same directory
    // path through different rules; the path and its descendants vanish.
    let repo = create_repo(
        "out Child(Folder) : Directory()\n\
         out Child(Model) : Directory()\n",
    );
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    let shared_folder = child(&mut tree, root, "Folder", "Shared");
    child(&mut tree, shared_folder, "Folder", "Inner");
    let shared_model = child(&mut tree, root, "Model", "Shared");
    child(&mut tree, shared_model, "Folder", "Other");
    child(&mut tree, root, "Folder", "Survivor");
    write_place(repo.path(), "world.rbxl", &tree, root);

    sync_out(repo.path(), &SyncOptions::default()).unwrap();

    let out_dir = repo.path().join("world");
    assert!(!out_dir.join("Shared").exists());
    assert!(out_dir.join("Survivor").is_dir());
}

#[test]
fn same_name_selected_siblings_are_skipped_by_directory_filter() {
    let repo = create_repo("out Child(*) : Directory()\n");
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    child(&mut tree, root, "Folder", "Twin");
    child(&mut tree, root, "Folder", "Twin");
    child(&mut tree, root, "Folder", "Solo");
    write_place(repo.path(), "world.rbxl", &tree, root);

    sync_out(repo.path(), &SyncOptions::default()).unwrap();

    let out_dir = repo.path().join("world");
    assert!(!out_dir.join("Twin").exists());
    assert!(out_dir.join("Solo").is_dir());
}

#[test]
fn sync_out_is_idempotent() {
    let repo = create_repo(
        "out Child(*) : Directory()\n\
         out Property(*, Source, ProtectedString) : PropertyName(lua)\n",
    );
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    let folder = child(&mut tree, root, "Folder", "Stuff");
    let script = child(&mut tree, folder, "Script", "Run");
    tree.set_property(script, "Source", Value::ProtectedString("return 1".into()));
    write_place(repo.path(), "world.rbxl", &tree, root);

    sync_out(repo.path(), &SyncOptions::default()).unwrap();
    let first = snapshot(&repo.path().join("world"));
    sync_out(repo.path(), &SyncOptions::default()).unwrap();
    let second = snapshot(&repo.path().join("world"));
    assert_eq!(first, second);
}

#[test]
fn sync_out_is_deterministic_across_runs() {
    let build = || {
        let repo = create_repo(
            "out Child(*) : Directory()\n\
             out Property(*, *, ProtectedString) : PropertyName(lua)\n\
             out Property(*, *, Bool) : File(flags.json)\n",
        );
        let mut tree = Tree::new();
        let root = tree.insert("DataModel");
        for name in ["B", "A", "C"] {
            let folder = child(&mut tree, root, "Folder", name);
            let script = child(&mut tree, folder, "Script", "Main");
            tree.set_property(
                script,
                "Source",
                Value::ProtectedString(format!("-- {name}")),
            );
            tree.set_property(folder, "Archivable", Value::Bool(true));
        }
        write_place(repo.path(), "world.rbxl", &tree, root);
        sync_out(repo.path(), &SyncOptions::default()).unwrap();
        snapshot(&repo.path().join("world"))
    };

    assert_eq!(build(), build());
}

#[test]
fn no_places_is_reported_not_fatal() {
    let repo = create_repo("out Child(*) : Ignore()\n");
    let report = sync_out(repo.path(), &SyncOptions::default()).unwrap();
    assert!(report.success);
    assert!(report.actions.iter().any(|a| a.contains("no files")));
}
