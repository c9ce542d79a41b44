use std::collections::HashSet;
use std::fs;

use codegraph::domain::{LinkKind, NodeKind};
use codegraph::infrastructure::PythonExtractor;
use codegraph::ports::GraphExtractor;
use tempfile::tempdir;

#[test]
fn test_class_method_calling_function() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("foo.py");
    fs::write(
        &path,
        "class Foo:\n    def bar(self):\n        baz()\n\ndef baz():\n    pass\n",
    )
    .unwrap();

    let graph = PythonExtractor::new().extract(&path).unwrap();

    let keys: Vec<&str> = graph.nodes.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["Foo", "Foo.bar", "baz"]);
    assert_eq!(graph.node("Foo").unwrap().kind, NodeKind::Type);
    assert_eq!(graph.node("Foo.bar").unwrap().kind, NodeKind::Member);
    assert_eq!(graph.node("baz").unwrap().kind, NodeKind::Function);

    assert_eq!(graph.links.len(), 2);
    assert!(graph.has_link("Foo", "Foo.bar", LinkKind::Containment));
    assert!(graph.has_link("Foo.bar", "baz", LinkKind::Call));
}

#[test]
fn test_inheritance_from_in_file_base() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shapes.py");
    fs::write(
        &path,
        "class A:\n    pass\n\nclass B(A):\n    def area(self):\n        return 0\n",
    )
    .unwrap();

    let graph = PythonExtractor::new().extract(&path).unwrap();

    assert!(graph.has_link("B", "A", LinkKind::Inheritance));
    assert!(graph.has_link("B", "B.area", LinkKind::Containment));
}

#[test]
fn test_unused_from_import_is_dropped_used_one_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("imports.py");
    fs::write(
        &path,
        "from mod import helper\nfrom util import tool\n\ndef main():\n    tool()\n",
    )
    .unwrap();

    let graph = PythonExtractor::new().extract(&path).unwrap();

    assert!(graph.node("helper").is_none());
    let tool = graph.node("tool").unwrap();
    assert_eq!(tool.kind, NodeKind::Import);
    assert_eq!(tool.source_text, "from util import tool");
    assert!(graph.has_link("main", "tool", LinkKind::ImportUse));
}

#[test]
fn test_empty_module_has_empty_graph() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.py");
    fs::write(&path, "# nothing here\nx = 1\n").unwrap();

    let graph = PythonExtractor::new().extract(&path).unwrap();
    assert!(graph.is_empty());
}

#[test]
fn test_extraction_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("svc.py");
    fs::write(
        &path,
        "from db import connect\n\nclass Service:\n    def start(self):\n        connect()\n        self.run()\n\n    def run(self):\n        helper()\n\ndef helper():\n    pass\n",
    )
    .unwrap();

    let extractor = PythonExtractor::new();
    let first = extractor.extract(&path).unwrap();
    let second = extractor.extract(&path).unwrap();

    let nodes = |g: &codegraph::domain::CodeGraph| g.nodes.iter().cloned().collect::<HashSet<_>>();
    let links = |g: &codegraph::domain::CodeGraph| g.links.iter().cloned().collect::<HashSet<_>>();
    assert_eq!(nodes(&first), nodes(&second));
    assert_eq!(links(&first), links(&second));
    assert!(first.has_link("Service.start", "Service.run", LinkKind::Call));
    assert!(first.has_link("Service.start", "connect", LinkKind::ImportUse));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let err = PythonExtractor::new()
        .extract(&dir.path().join("absent.py"))
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn test_malformed_source_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.py");
    fs::write(&path, "def broken(:\n    pass\n").unwrap();

    let err = PythonExtractor::new().extract(&path).unwrap_err();
    assert_eq!(err.kind(), "parse");
}
