//! Active-Project Resolver
//!
//! The "current project" is selected by an outside session action and read by
//! tree and graph requests. Readers take a [`ProjectContext`] snapshot at the
//! start of a request so a concurrent switch cannot change the root mid-way.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CodegraphError, Result};

/// Project identity as handed over by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl Project {
    pub fn new(id: i64, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Request-scoped view of the selected project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    pub project: Project,
    pub root: PathBuf,
}

impl ProjectContext {
    pub fn new(project: Project, projects_root: &Path) -> Self {
        let root = projects_root.join(&project.name);
        Self { project, root }
    }

    /// Relative paths that are not already spelled under the root are taken
    /// as project-relative.
    pub fn resolve(&self, raw: &Path) -> PathBuf {
        if raw.is_absolute() || raw.starts_with(&self.root) {
            raw.to_path_buf()
        } else {
            self.root.join(raw)
        }
    }

    /// Reject paths that leave the project root once symlinks and `..` are
    /// resolved.
    pub fn confine(&self, path: &Path) -> Result<PathBuf> {
        let canonical = path
            .canonicalize()
            .map_err(|_| CodegraphError::not_found(path))?;
        let root = self
            .root
            .canonicalize()
            .map_err(|_| CodegraphError::not_found(&self.root))?;

        if canonical.starts_with(&root) {
            Ok(canonical)
        } else {
            Err(CodegraphError::OutsideProject {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
        }
    }
}

/// Process-wide holder of the current project.
#[derive(Debug)]
pub struct ActiveProject {
    projects_root: PathBuf,
    current: RwLock<Option<Project>>,
}

impl ActiveProject {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
            current: RwLock::new(None),
        }
    }

    pub fn projects_root(&self) -> &Path {
        &self.projects_root
    }

    pub fn set_current(&self, project: Project) {
        info!(id = project.id, name = %project.name, "active project set");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(project);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn current(&self) -> Option<Project> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_root(&self) -> Option<PathBuf> {
        self.context().map(|ctx| ctx.root)
    }

    /// Snapshot for one request. The lock is released before returning.
    pub fn context(&self) -> Option<ProjectContext> {
        self.current()
            .map(|project| ProjectContext::new(project, &self.projects_root))
    }
}
