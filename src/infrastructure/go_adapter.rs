//! Cross-language adapter for Go sources.
//!
//! Go files are parsed by a separately built `parser` binary that prints one
//! JSON object mapping declaration keys to `{Name, Type, Code, Calls}`. This
//! module runs it with a bounded timeout and normalizes its output into the
//! shared graph shape.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::config::GoConfig;
use crate::domain::graph::{CodeGraph, DeclarationNode, Link, LinkKind, NodeKind};
use crate::domain::linker::{CallGraphLinker, CallerCalls, ExactKeyResolver};
use crate::domain::Language;
use crate::error::{CodegraphError, ExternalToolFailure, Result};
use crate::ports::GraphExtractor;

static GENERIC_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("generic parameter pattern is valid"));

/// One entry of the parser's output, keyed by declaration key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForeignDeclaration {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Calls", default)]
    pub calls: Option<Vec<String>>,
    #[serde(rename = "Position", default)]
    pub position: Option<String>,
}

/// Sorted by key, the order Go's encoder writes map keys in.
pub type DeclarationMap = BTreeMap<String, ForeignDeclaration>;

pub fn parse_declarations(output: &str) -> serde_json::Result<DeclarationMap> {
    serde_json::from_str(output.trim())
}

/// Receiver type of a method key: `Type.Method`, or the bracketed form
/// `&{<expr> Type}.Method` the parser emits for pointer receivers. Generic
/// parameters (`[T]`) are stripped.
pub fn receiver_type(key: &str) -> String {
    let receiver = if key.starts_with('&') || key.starts_with('{') {
        key.split(|c: char| c == '{' || c == '}')
            .nth(1)
            .and_then(|inner| inner.trim().split(' ').last())
            .unwrap_or("")
    } else {
        key.split('.').next().unwrap_or(key)
    };
    GENERIC_PARAMS.replace_all(receiver, "").trim().to_string()
}

pub fn method_name(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

/// Normalize the parser's declaration map into nodes and links.
///
/// Methods are linked from their receiver only when that receiver is a type
/// declared in the same file. Calls link only to keys present in the map.
pub fn normalize(decls: &DeclarationMap) -> CodeGraph {
    let mut nodes = Vec::new();
    let mut types = HashSet::new();
    let mut methods = Vec::new();
    let mut keys = ExactKeyResolver::default();
    let mut callers = Vec::new();

    for (raw_key, decl) in decls {
        let node = match decl.kind.as_str() {
            "import" => DeclarationNode::new(
                raw_key,
                decl.name.as_str(),
                NodeKind::Import,
                format!("import {}", decl.code),
            ),
            "type" => {
                types.insert(raw_key.as_str());
                DeclarationNode::new(
                    raw_key,
                    decl.name.as_str(),
                    NodeKind::Type,
                    format!("type {}", decl.code),
                )
            }
            "method" => {
                let receiver = receiver_type(raw_key);
                let name = method_name(raw_key);
                let key = format!("{receiver}.{name}");
                methods.push((receiver, key.clone()));
                DeclarationNode::new(key, name, NodeKind::Member, decl.code.as_str())
            }
            "func" => DeclarationNode::new(
                raw_key,
                decl.name.as_str(),
                NodeKind::Function,
                decl.code.as_str(),
            ),
            other => {
                debug!(key = %raw_key, kind = %other, "skipping foreign declaration");
                continue;
            }
        };

        keys.insert(raw_key.as_str(), node.key.as_str());
        callers.push(CallerCalls::new(
            node.key.clone(),
            decl.calls.clone().unwrap_or_default(),
        ));
        nodes.push(node);
    }

    let mut links: Vec<Link> = methods
        .iter()
        .filter(|(receiver, _)| types.contains(receiver.as_str()))
        .map(|(receiver, key)| Link::new(receiver, key, LinkKind::Containment))
        .collect();
    links.extend(CallGraphLinker::resolve(&callers, &keys).links);

    CodeGraph::new(nodes, links)
}

/// Runs the external Go parser, one process per file.
pub struct GoAdapter {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl GoAdapter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn from_config(config: &GoConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn run_parser(&self, path: &Path) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CodegraphError::external(
                    path,
                    ExternalToolFailure::Spawn {
                        program: self.program.display().to_string(),
                        reason: e.to_string(),
                    },
                )
            })?;

        // Drain both pipes while waiting so a large output cannot block the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(
                    path = %path.display(),
                    timeout = ?self.timeout,
                    "go parser timed out"
                );
                return Err(CodegraphError::external(
                    path,
                    ExternalToolFailure::Timeout(self.timeout),
                ));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            // the Go parser prints its own errors on stdout
            let output = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(CodegraphError::external(
                path,
                ExternalToolFailure::ExitStatus {
                    code: status.code(),
                    output: output.to_string(),
                },
            ));
        }
        Ok(stdout)
    }
}

impl GraphExtractor for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extract(&self, path: &Path) -> Result<CodeGraph> {
        if !path.is_file() {
            return Err(CodegraphError::not_found(path));
        }

        let output = self.run_parser(path)?;
        let decls = parse_declarations(&output).map_err(|e| {
            CodegraphError::external(path, ExternalToolFailure::MalformedOutput(e.to_string()))
        })?;
        let graph = normalize(&decls);

        info!(
            path = %path.display(),
            declarations = decls.len(),
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "extracted go graph"
        );
        Ok(graph)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(handle: JoinHandle<Vec<u8>>) -> String {
    let bytes = handle.join().unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
