//! Bulk extraction over a directory.
//!
//! Files are extracted in parallel on the rayon pool. A file that fails is
//! logged and recorded, the rest of the batch carries on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::dto::GraphDto;
use crate::config::TreeConfig;
use crate::domain::CodeGraph;
use crate::error::Result;
use crate::infrastructure::{ExtractorRegistry, FileTreeBuilder};

#[derive(Debug)]
pub struct ProjectIndex {
    graphs: DashMap<PathBuf, CodeGraph>,
    failures: DashMap<PathBuf, String>,
}

/// Serializable snapshot, sorted by path.
#[derive(Debug, Serialize)]
pub struct IndexReport {
    pub graphs: BTreeMap<PathBuf, GraphDto>,
    pub failures: BTreeMap<PathBuf, String>,
}

impl ProjectIndex {
    /// Extract every file under `root` that some registered extractor handles.
    pub fn build(registry: &ExtractorRegistry, root: &Path, limits: &TreeConfig) -> Result<Self> {
        let tree = FileTreeBuilder::new(&registry.extensions())
            .with_limits(limits)
            .list(root)?;
        let files: Vec<PathBuf> = tree.iter().flat_map(|entry| entry.files()).collect();
        Ok(Self::from_files(registry, &files))
    }

    pub fn from_files(registry: &ExtractorRegistry, files: &[PathBuf]) -> Self {
        let index = Self {
            graphs: DashMap::new(),
            failures: DashMap::new(),
        };

        files.par_iter().for_each(|path| match registry.extract(path) {
            Ok(graph) => {
                index.graphs.insert(path.clone(), graph);
            }
            Err(e) => {
                warn!(path = %path.display(), kind = e.kind(), error = %e, "skipping file");
                index.failures.insert(path.clone(), e.to_string());
            }
        });

        info!(
            files = files.len(),
            extracted = index.graphs.len(),
            failed = index.failures.len(),
            "built project index"
        );
        index
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn graph(&self, path: &Path) -> Option<CodeGraph> {
        self.graphs.get(path).map(|g| g.value().clone())
    }

    pub fn failure(&self, path: &Path) -> Option<String> {
        self.failures.get(path).map(|f| f.value().clone())
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn report(&self) -> IndexReport {
        IndexReport {
            graphs: self
                .graphs
                .iter()
                .map(|entry| (entry.key().clone(), GraphDto::from(entry.value())))
                .collect(),
            failures: self
                .failures
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        }
    }
}
