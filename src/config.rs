//! Configuration for Codegraph.
//!
//! Loaded from a TOML file; every field has a default so partial files work.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Language;
use crate::error::{CodegraphError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegraphConfig {
    /// Directory holding one checkout per project, named after the project.
    pub projects_root: PathBuf,
    /// Language used to filter the file tree when none is requested.
    pub default_language: Language,
    /// Reject request paths that resolve outside the active project.
    pub confine_paths: bool,
    pub go: GoConfig,
    pub tree: TreeConfig,
    pub server: ServerConfig,
}

impl Default for CodegraphConfig {
    fn default() -> Self {
        Self {
            projects_root: PathBuf::from("projects"),
            default_language: Language::Python,
            confine_paths: true,
            go: GoConfig::default(),
            tree: TreeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl CodegraphConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CodegraphError::Config(e.to_string()))
    }

    /// Defaults when no path is given or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}

/// External Go parser invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    pub program: PathBuf,
    /// Arguments placed before the file path (e.g. a script for an interpreter).
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

impl GoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("./parser"),
            args: Vec::new(),
            timeout_ms: 5_000,
        }
    }
}

/// Resource caps for file tree listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub max_entries: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_entries: 50_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = CodegraphConfig::from_toml(
            r#"
            projects_root = "/srv/projects"
            default_language = "go"

            [go]
            timeout_ms = 750
            "#,
        )
        .unwrap();

        assert_eq!(config.projects_root, PathBuf::from("/srv/projects"));
        assert_eq!(config.default_language, Language::Go);
        assert_eq!(config.go.timeout(), Duration::from_millis(750));
        assert_eq!(config.go.program, PathBuf::from("./parser"));
        assert_eq!(config.tree.max_depth, 32);
        assert_eq!(config.server.address(), "127.0.0.1:5000");
        assert!(config.confine_paths);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = CodegraphConfig::from_toml("projects_root = [").unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = CodegraphConfig::load_or_default(Some(&dir.path().join("none.toml"))).unwrap();
        assert_eq!(config.projects_root, PathBuf::from("projects"));

        std::fs::write(dir.path().join("c.toml"), "[server]\nport = 6100\n").unwrap();
        let config = CodegraphConfig::load_or_default(Some(&dir.path().join("c.toml"))).unwrap();
        assert_eq!(config.server.port, 6100);
    }
}
