use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::CodegraphConfig;
use crate::domain::{CodeGraph, Language};
use crate::error::{CodegraphError, Result};
use crate::infrastructure::go_adapter::GoAdapter;
use crate::infrastructure::python::PythonExtractor;
use crate::ports::GraphExtractor;

/// Extractors selected by file extension.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn GraphExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Python in-process, Go through the external parser.
    pub fn from_config(config: &CodegraphConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PythonExtractor::new()));
        registry.register(Arc::new(GoAdapter::from_config(&config.go)));
        registry
    }

    /// A later registration for the same language replaces the earlier one.
    pub fn register(&mut self, extractor: Arc<dyn GraphExtractor>) {
        let language = extractor.language();
        self.extractors.retain(|e| e.language() != language);
        self.extractors.push(extractor);
    }

    pub fn languages(&self) -> Vec<Language> {
        self.extractors.iter().map(|e| e.language()).collect()
    }

    /// Every extension some extractor handles.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.extractors
            .iter()
            .flat_map(|e| e.language().extensions().iter().copied())
            .collect()
    }

    pub fn for_path(&self, path: &Path) -> Result<&dyn GraphExtractor> {
        let language = Language::from_path(path).ok_or_else(|| CodegraphError::UnsupportedInput {
            path: path.to_path_buf(),
        })?;
        self.extractors
            .iter()
            .find(|e| e.language() == language)
            .map(|e| e.as_ref())
            .ok_or_else(|| CodegraphError::UnsupportedInput {
                path: path.to_path_buf(),
            })
    }

    pub fn extract(&self, path: &Path) -> Result<CodeGraph> {
        let extractor = self.for_path(path)?;
        debug!(path = %path.display(), language = %extractor.language(), "dispatching extraction");
        extractor.extract(path)
    }
}
