use std::path::Path;

use crate::domain::{CodeGraph, Language};
use crate::error::Result;

/// Builds the declaration graph of one source file.
pub trait GraphExtractor: Send + Sync {
    fn language(&self) -> Language;
    fn extract(&self, path: &Path) -> Result<CodeGraph>;
}

pub trait OutputExporter {
    fn render(&self, graph: &CodeGraph) -> Result<String>;

    fn export(&self, graph: &CodeGraph, path: &Path) -> Result<()> {
        let content = self.render(graph)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
