//! End-to-end sync-in scenarios against real temp repositories

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use rbxfs_core::{sync_in, sync_out, SyncOptions};
use rbxfs_format::Format as _;
use rbxfs_tree::{ObjectId, RefTable, Selection, Tree, Value};

fn create_repo(rules: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let meta = temp.path().join(".rbxfs");
    fs::create_dir(&meta).unwrap();
    fs::write(meta.join("rules"), rules).unwrap();
    temp
}

fn object_dir(base: &Path, name: &str, class: &str) {
    let dir = base.join(name);
    fs::create_dir(&dir).unwrap();
    fs::write(
        dir.join("data"),
        format!(r#"{{"class_name": "{class}", "reference": "", "is_service": false}}"#),
    )
    .unwrap();
}

fn write_model(path: &Path, build: impl FnOnce(&mut Tree, ObjectId)) {
    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    build(&mut tree, root);
    let selection =
        Selection::with_children(root, (0..tree.children(root).len()).collect());
    let mut bytes = Vec::new();
    rbxfs_format::model::RBXMX
        .encode(&tree, &[selection], &mut bytes)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

fn decode_place(path: &Path) -> (Tree, Vec<ObjectId>) {
    let mut tree = Tree::new();
    let mut refs = RefTable::new();
    let bytes = fs::read(path).unwrap();
    let source = rbxfs_format::model::RBXL
        .decode(&mut tree, &mut refs, &mut bytes.as_slice())
        .unwrap();
    (tree, source.children)
}

#[test]
fn reconstructs_workspace_with_decoded_part() {
    let repo = create_repo(
        "in Directory(*, *) : Children()\n\
         in File(*.rbxmx) : Children()\n",
    );
    let place_dir = repo.path().join("world");
    fs::create_dir(&place_dir).unwrap();
    object_dir(&place_dir, "Workspace", "Workspace");
    write_model(
        &place_dir.join("Workspace").join("Part.rbxmx"),
        |tree, root| {
            let part = tree.insert("Part");
            tree.set_name(part, "Part");
            tree.set_parent(part, Some(root)).unwrap();
        },
    );

    let report = sync_in(repo.path(), None, &SyncOptions::default()).unwrap();
    assert!(report.success);

    let (tree, roots) = decode_place(&repo.path().join("new-world.rbxl"));
    assert_eq!(roots.len(), 1);
    let workspace = roots[0];
    assert_eq!(tree.class_name(workspace), "Workspace");
    assert_eq!(tree.name(workspace), "Workspace");
    let children: Vec<&str> = tree
        .children(workspace)
        .iter()
        .map(|&id| tree.name(id))
        .collect();
    assert_eq!(children, vec!["Part"]);
}

#[test]
fn property_filter_maps_file_content_to_named_property() {
    let repo = create_repo(
        "in Directory(*, *) : Children()\n\
         in File(banner.txt) : Property(Banner)\n",
    );
    let place_dir = repo.path().join("world");
    fs::create_dir(&place_dir).unwrap();
    object_dir(&place_dir, "Config", "Folder");
    fs::write(place_dir.join("Config").join("banner.txt"), b"hello").unwrap();

    sync_in(repo.path(), None, &SyncOptions::default()).unwrap();

    let (tree, roots) = decode_place(&repo.path().join("new-world.rbxl"));
    let config = roots[0];
    assert_eq!(
        tree.property(config, "Banner"),
        Some(&Value::String("hello".into()))
    );
}

#[test]
fn services_marked_from_catalog() {
    let repo = create_repo("in Directory(*, *) : Children()\n");
    fs::write(
        repo.path().join(".rbxfs").join("services"),
        r#"{"classes": {"Workspace": {"service": true}, "Folder": {}}}"#,
    )
    .unwrap();
    let place_dir = repo.path().join("world");
    fs::create_dir(&place_dir).unwrap();
    object_dir(&place_dir, "Workspace", "Workspace");
    object_dir(&place_dir, "Extras", "Folder");

    sync_in(repo.path(), None, &SyncOptions::default()).unwrap();

    let (tree, roots) = decode_place(&repo.path().join("new-world.rbxl"));
    let by_class: Vec<(String, bool)> = roots
        .iter()
        .map(|&id| (tree.class_name(id).to_string(), tree.is_service(id)))
        .collect();
    assert!(by_class.contains(&("Workspace".to_string(), true)));
    assert!(by_class.contains(&("Folder".to_string(), false)));
}

#[test]
fn ignored_files_are_left_out() {
    let repo = create_repo(
        "in Directory(*, *) : Children()\n\
         in File(keep.rbxmx) : Children()\n\
         in File(junk.rbxmx) : Ignore()\n",
    );
    let place_dir = repo.path().join("world");
    fs::create_dir(&place_dir).unwrap();
    object_dir(&place_dir, "Stuff", "Folder");
    write_model(&place_dir.join("Stuff").join("keep.rbxmx"), |tree, root| {
        let part = tree.insert("Part");
        tree.set_name(part, "Kept");
        tree.set_parent(part, Some(root)).unwrap();
    });
    write_model(&place_dir.join("Stuff").join("junk.rbxmx"), |tree, root| {
        let part = tree.insert("Part");
        tree.set_name(part, "Junk");
        tree.set_parent(part, Some(root)).unwrap();
    });

    sync_in(repo.path(), None, &SyncOptions::default()).unwrap();

    let (tree, roots) = decode_place(&repo.path().join("new-world.rbxl"));
    let stuff = roots[0];
    let names: Vec<&str> = tree
        .children(stuff)
        .iter()
        .map(|&id| tree.name(id))
        .collect();
    assert_eq!(names, vec!["Kept"], "ignored source must not be adopted");
}

#[test]
fn requested_directory_filter_restricts_the_run() {
    let repo = create_repo("in Directory(*, *) : Children()\n");
    for dir in ["alpha", "beta"] {
        let place_dir = repo.path().join(dir);
        fs::create_dir(&place_dir).unwrap();
        object_dir(&place_dir, "Workspace", "Workspace");
    }

    sync_in(
        repo.path(),
        Some(&["alpha".to_string()]),
        &SyncOptions::default(),
    )
    .unwrap();

    assert!(repo.path().join("new-alpha.rbxl").is_file());
    assert!(!repo.path().join("new-beta.rbxl").exists());
}

/// Weak round-trip: everything the rules capture survives out-then-in.
#[test]
fn round_trip_preserves_captured_triples() {
    let repo = create_repo(
        "out Child(*) : Directory()\n\
         out Property(*, Source, ProtectedString) : PropertyName(lua)\n\
         in Directory(*, *) : Children()\n\
         in File(*.lua) : PropertyName()\n",
    );

    let mut tree = Tree::new();
    let root = tree.insert("DataModel");
    let workspace = tree.insert("Folder");
    tree.set_name(workspace, "Game");
    tree.set_parent(workspace, Some(root)).unwrap();
    for name in ["Init", "Util"] {
        let script = tree.insert("Script");
        tree.set_name(script, name);
        tree.set_parent(script, Some(workspace)).unwrap();
        tree.set_property(
            script,
            "Source",
            Value::ProtectedString(format!("-- {name}")),
        );
    }

    let selection = Selection::with_children(root, vec![0]);
    let mut bytes = Vec::new();
    rbxfs_format::model::RBXL
        .encode(&tree, &[selection], &mut bytes)
        .unwrap();
    fs::write(repo.path().join("world.rbxl"), bytes).unwrap();

    sync_out(repo.path(), &SyncOptions::default()).unwrap();
    sync_in(
        repo.path(),
        Some(&["world".to_string()]),
        &SyncOptions::default(),
    )
    .unwrap();

    let (out_tree, roots) = decode_place(&repo.path().join("new-world.rbxl"));

    fn triples(
        tree: &Tree,
        roots: &[ObjectId],
    ) -> BTreeSet<(String, String, Option<Value>)> {
        fn visit(
            tree: &Tree,
            id: ObjectId,
            path: String,
            out: &mut BTreeSet<(String, String, Option<Value>)>,
        ) {
            out.insert((
                path.clone(),
                tree.class_name(id).to_string(),
                tree.property(id, "Source").cloned(),
            ));
            for &child in tree.children(id) {
                let child_path = format!("{path}/{}", tree.name(child));
                visit(tree, child, child_path, out);
            }
        }
        let mut out = BTreeSet::new();
        for &id in roots {
            visit(tree, id, format!("/{}", tree.name(id)), &mut out);
        }
        out
    }

    let original = triples(&tree, &[workspace]);
    let reconstructed = triples(&out_tree, &roots);
    assert_eq!(original, reconstructed);
}

#[test]
fn no_directories_is_reported_not_fatal() {
    let repo = create_repo("in Directory(*, *) : Children()\n");
    let report = sync_in(repo.path(), None, &SyncOptions::default()).unwrap();
    assert!(report.success);
    assert!(report.actions.iter().any(|a| a.contains("no files")));
}
