use std::fs;

use codegraph::domain::{EntryKind, Language};
use codegraph::infrastructure::FileTreeBuilder;
use tempfile::tempdir;

#[test]
fn test_filters_by_extension_at_every_level() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("pkg")).unwrap();
    fs::write(dir.path().join("pkg/mod.py"), "").unwrap();
    fs::write(dir.path().join("pkg/notes.txt"), "").unwrap();
    fs::write(dir.path().join("README.md"), "").unwrap();

    let tree = FileTreeBuilder::new(Language::Python.extensions())
        .list(dir.path())
        .unwrap();

    assert_eq!(tree.len(), 1);
    let pkg = &tree[0];
    assert_eq!(pkg.name, "pkg");
    assert_eq!(pkg.kind, EntryKind::Directory);
    assert_eq!(pkg.path, dir.path().join("pkg"));

    let children = pkg.children.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "mod.py");
    assert_eq!(children[0].kind, EntryKind::File);
    assert!(children[0].children.is_none());
}

#[test]
fn test_empty_directories_are_kept() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b/c")).unwrap();

    let tree = FileTreeBuilder::new(&["go"]).list(dir.path()).unwrap();

    let b = &tree[0].children.as_ref().unwrap()[0];
    assert_eq!(b.name, "b");
    let c = &b.children.as_ref().unwrap()[0];
    assert_eq!(c.name, "c");
    assert_eq!(c.children, Some(vec![]));
}

#[test]
fn test_serialized_shape() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.go"), "").unwrap();

    let tree = FileTreeBuilder::new(&["go"]).list(dir.path()).unwrap();
    let value = serde_json::to_value(&tree).unwrap();

    assert_eq!(value[0]["name"], "src");
    assert_eq!(value[0]["type"], "directory");
    assert_eq!(value[0]["children"][0]["name"], "main.go");
    assert_eq!(value[0]["children"][0]["type"], "file");
    assert!(value[0]["children"][0].get("children").is_none());
}

#[test]
fn test_files_flatten_depth_first() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/x.py"), "").unwrap();
    fs::write(dir.path().join("y.py"), "").unwrap();

    let tree = FileTreeBuilder::new(&["py"]).list(dir.path()).unwrap();
    let files: Vec<_> = tree.iter().flat_map(|e| e.files()).collect();

    assert_eq!(files, vec![dir.path().join("a/x.py"), dir.path().join("y.py")]);
}
