// Domain model for Codegraph: declarations, links, linking and project state.

pub mod graph;
pub mod language;
pub mod linker;
pub mod project;
pub mod tree;

pub use graph::{CodeGraph, DeclarationNode, Link, LinkKind, NodeKind};
pub use language::Language;
pub use project::{ActiveProject, Project, ProjectContext};
pub use tree::{EntryKind, TreeEntry};
