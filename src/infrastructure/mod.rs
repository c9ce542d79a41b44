// Infrastructure implementations for Codegraph.

pub mod concurrency;
pub mod exporter;
pub mod file_tree;
pub mod go_adapter;
pub mod python;
pub mod registry;

pub use exporter::{DotExporter, JsonExporter};
pub use file_tree::FileTreeBuilder;
pub use go_adapter::GoAdapter;
pub use python::PythonExtractor;
pub use registry::ExtractorRegistry;
