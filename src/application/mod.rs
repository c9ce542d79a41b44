//! Request orchestration: active project, path policy, extractor selection.

pub mod project_index;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{CodegraphConfig, TreeConfig};
use crate::domain::{ActiveProject, CodeGraph, Language, ProjectContext, TreeEntry};
use crate::error::{CodegraphError, Result};
use crate::infrastructure::{ExtractorRegistry, FileTreeBuilder};

pub use project_index::{IndexReport, ProjectIndex};

pub struct CodegraphService {
    registry: ExtractorRegistry,
    projects: ActiveProject,
    tree_limits: TreeConfig,
    default_language: Language,
    confine_paths: bool,
}

impl CodegraphService {
    pub fn new(config: &CodegraphConfig) -> Self {
        Self::with_registry(config, ExtractorRegistry::from_config(config))
    }

    pub fn with_registry(config: &CodegraphConfig, registry: ExtractorRegistry) -> Self {
        Self {
            registry,
            projects: ActiveProject::new(config.projects_root.clone()),
            tree_limits: config.tree.clone(),
            default_language: config.default_language,
            confine_paths: config.confine_paths,
        }
    }

    pub fn projects(&self) -> &ActiveProject {
        &self.projects
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Graph of one file. With an active project, relative paths resolve
    /// under its root; without one the path is used as given.
    pub fn graph(&self, filepath: &Path) -> Result<CodeGraph> {
        let path = match self.projects.context() {
            Some(ctx) => self.resolve_in(&ctx, filepath)?,
            None => filepath.to_path_buf(),
        };
        debug!(requested = %filepath.display(), resolved = %path.display(), "graph request");
        self.registry.extract(&path)
    }

    /// Tree of the active project's root.
    pub fn tree(&self, language: Option<Language>) -> Result<Vec<TreeEntry>> {
        let ctx = self.projects.context().ok_or(CodegraphError::NoActiveProject)?;
        self.tree_at(&ctx.root, language)
    }

    pub fn tree_at(&self, dir: &Path, language: Option<Language>) -> Result<Vec<TreeEntry>> {
        let language = language.unwrap_or(self.default_language);
        FileTreeBuilder::new(language.extensions())
            .with_limits(&self.tree_limits)
            .list(dir)
    }

    pub fn index(&self, dir: &Path) -> Result<ProjectIndex> {
        ProjectIndex::build(&self.registry, dir, &self.tree_limits)
    }

    fn resolve_in(&self, ctx: &ProjectContext, filepath: &Path) -> Result<PathBuf> {
        let path = ctx.resolve(filepath);
        if self.confine_paths {
            ctx.confine(&path)
        } else {
            Ok(path)
        }
    }
}
