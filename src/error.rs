//! Error taxonomy for graph extraction, tree listing and project resolution.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodegraphError>;

#[derive(Error, Debug)]
pub enum CodegraphError {
    #[error("path not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("external parser failed on {}: {failure}", path.display())]
    ExternalTool {
        path: PathBuf,
        failure: ExternalToolFailure,
    },

    #[error("no extractor registered for {}", path.display())]
    UnsupportedInput { path: PathBuf },

    #[error("repository path not set: no active project")]
    NoActiveProject,

    #[error("{} is outside the project root {}", path.display(), root.display())]
    OutsideProject { path: PathBuf, root: PathBuf },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why the external parser process did not produce a usable declaration map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalToolFailure {
    #[error("could not start `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    #[error("exited with status {code:?}: {output}")]
    ExitStatus { code: Option<i32>, output: String },

    #[error("output is not a declaration map: {0}")]
    MalformedOutput(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl CodegraphError {
    /// Stable tag used when a failure crosses the IPC boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            CodegraphError::NotFound { .. } => "not_found",
            CodegraphError::Parse { .. } => "parse",
            CodegraphError::ExternalTool { .. } => "external_tool",
            CodegraphError::UnsupportedInput { .. } => "unsupported_input",
            CodegraphError::NoActiveProject => "no_active_project",
            CodegraphError::OutsideProject { .. } => "outside_project",
            CodegraphError::Config(_) => "config",
            CodegraphError::Io(_) => "io",
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        CodegraphError::NotFound { path: path.into() }
    }

    pub(crate) fn external(path: impl Into<PathBuf>, failure: ExternalToolFailure) -> Self {
        CodegraphError::ExternalTool {
            path: path.into(),
            failure,
        }
    }
}
