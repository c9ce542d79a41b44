//! Python source parser using tree-sitter-python.
//!
//! One pass over the syntax tree collects classes (anywhere in the file) with
//! their direct methods, top-level functions and top-level imports. Call names
//! found in each body are handed to the linker; imports that are never called
//! are dropped from the node set afterwards.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use tree_sitter::{Node, Parser, Tree};

use crate::domain::graph::{CodeGraph, DeclarationNode, Link, LinkKind, NodeKind};
use crate::domain::linker::{CallGraphLinker, CallerCalls, SymbolTable};
use crate::domain::Language;
use crate::error::{CodegraphError, Result};
use crate::ports::GraphExtractor;

pub struct PythonExtractor {
    language: tree_sitter::Language,
}

impl PythonExtractor {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Extract from already-loaded source. `path` is only used in errors.
    pub fn extract_source(&self, path: &Path, source: &str) -> Result<CodeGraph> {
        let tree = self.parse_tree(path, source)?;
        let mut collector = Collector::new(source);
        collector.collect(tree.root_node());
        Ok(collector.decls.into_graph())
    }

    fn parse_tree(&self, path: &Path, source: &str) -> Result<Tree> {
        let parse_error = |message: String| CodegraphError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| parse_error(format!("failed to load grammar: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("parser produced no tree".to_string()))?;

        if let Some(node) = first_invalid(tree.root_node()) {
            let at = node.start_position();
            return Err(parse_error(format!(
                "invalid syntax at line {}, column {}",
                at.row + 1,
                at.column + 1
            )));
        }
        Ok(tree)
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract(&self, path: &Path) -> Result<CodeGraph> {
        let bytes = fs::read(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot read source");
            CodegraphError::not_found(path)
        })?;
        let source = String::from_utf8(bytes).map_err(|e| CodegraphError::Parse {
            path: path.to_path_buf(),
            message: format!("source is not valid UTF-8: {e}"),
        })?;

        let graph = self.extract_source(path, &source)?;
        info!(
            path = %path.display(),
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "extracted python graph"
        );
        Ok(graph)
    }
}

// ── Declarations ──────────────────────────────────────────────────────────

struct TypeDecl {
    name: String,
    source: String,
    bases: Vec<String>,
}

struct MemberDecl {
    owner: String,
    name: String,
    source: String,
    calls: Vec<String>,
}

impl MemberDecl {
    fn key(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

struct FunctionDecl {
    name: String,
    source: String,
    calls: Vec<String>,
}

struct ImportDecl {
    binding: String,
    source: String,
    /// `module.name` for `from` imports; only these resolve calls.
    origin: Option<String>,
}

#[derive(Default)]
struct FileDeclarations {
    types: Vec<TypeDecl>,
    members: Vec<MemberDecl>,
    functions: Vec<FunctionDecl>,
    imports: Vec<ImportDecl>,
}

impl FileDeclarations {
    fn into_graph(self) -> CodeGraph {
        let mut table = SymbolTable::new();
        for member in &self.members {
            table.add_member(member.key(), member.name.as_str());
        }
        for function in &self.functions {
            table.add_function(function.name.as_str());
        }
        for import in &self.imports {
            if let Some(origin) = &import.origin {
                table.add_import(import.binding.as_str(), origin.as_str());
            }
        }

        let callers: Vec<CallerCalls> = self
            .members
            .iter()
            .map(|m| CallerCalls::new(m.key(), m.calls.clone()))
            .chain(
                self.functions
                    .iter()
                    .map(|f| CallerCalls::new(f.name.clone(), f.calls.clone())),
            )
            .collect();
        let resolution = CallGraphLinker::resolve(&callers, &table);

        let mut nodes = Vec::new();
        let mut links = Vec::new();

        for ty in &self.types {
            nodes.push(DeclarationNode::new(&ty.name, &ty.name, NodeKind::Type, &ty.source));
        }
        for member in self.members {
            let key = member.key();
            links.push(Link::new(&member.owner, &key, LinkKind::Containment));
            nodes.push(DeclarationNode::new(key, member.name, NodeKind::Member, member.source));
        }
        for function in self.functions {
            nodes.push(DeclarationNode::new(
                &function.name,
                function.name.as_str(),
                NodeKind::Function,
                function.source,
            ));
        }
        for import in self.imports {
            if !resolution.is_used(&import.binding) {
                debug!(binding = %import.binding, "dropping unused import");
                continue;
            }
            nodes.push(DeclarationNode::new(
                &import.binding,
                import.binding.as_str(),
                NodeKind::Import,
                import.source,
            ));
        }

        for ty in &self.types {
            for base in &ty.bases {
                links.push(Link::new(&ty.name, base, LinkKind::Inheritance));
            }
        }
        links.extend(resolution.links);

        CodeGraph::new(nodes, links)
    }
}

// ── Tree Walk ─────────────────────────────────────────────────────────────

struct Collector<'s> {
    source: &'s str,
    lines: Vec<&'s str>,
    decls: FileDeclarations,
}

impl<'s> Collector<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: source.lines().collect(),
            decls: FileDeclarations::default(),
        }
    }

    fn collect(&mut self, root: Node) {
        self.collect_types(root);

        let mut cursor = root.walk();
        for item in root.named_children(&mut cursor) {
            match item.kind() {
                "import_statement" => self.collect_import(item),
                "import_from_statement" => self.collect_from_import(item),
                _ => {
                    if let Some(def) = function_definition(item) {
                        self.collect_function(item, def);
                    }
                }
            }
        }
    }

    /// Pre-order over the whole tree, so nested classes are found too.
    fn collect_types(&mut self, root: Node) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "class_definition" {
                self.collect_class(node);
            }
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn collect_class(&mut self, class: Node) {
        let Some(name) = class.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name).to_string();

        let mut bases = Vec::new();
        if let Some(superclasses) = class.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                // `mod.Base`, `metaclass=...` and other expressions are not simple names
                if base.kind() == "identifier" {
                    bases.push(self.text(base).to_string());
                }
            }
        }

        if let Some(body) = class.child_by_field_name("body") {
            let mut cursor = body.walk();
            for item in body.named_children(&mut cursor) {
                let Some(def) = function_definition(item) else {
                    continue;
                };
                let Some(method) = def.child_by_field_name("name") else {
                    continue;
                };
                let member = MemberDecl {
                    owner: name.clone(),
                    name: self.text(method).to_string(),
                    source: self.span(def),
                    // decorator arguments count as calls of the member
                    calls: self.call_names(item),
                };
                self.decls.members.push(member);
            }
        }

        let source = self.span(class);
        self.decls.types.push(TypeDecl {
            name,
            source,
            bases,
        });
    }

    /// `item` is the statement itself, decorators included; `def` the definition inside it.
    fn collect_function(&mut self, item: Node, def: Node) {
        let Some(name) = def.child_by_field_name("name") else {
            return;
        };
        let function = FunctionDecl {
            name: self.text(name).to_string(),
            source: self.span(def),
            calls: self.call_names(item),
        };
        self.decls.functions.push(function);
    }

    fn collect_import(&mut self, stmt: Node) {
        let mut cursor = stmt.walk();
        for name in stmt.children_by_field_name("name", &mut cursor) {
            let (imported, alias) = self.aliased(name);
            let source = match &alias {
                Some(alias) => format!("import {imported} as {alias}"),
                None => format!("import {imported}"),
            };
            self.decls.imports.push(ImportDecl {
                binding: alias.unwrap_or_else(|| imported.clone()),
                source,
                origin: None,
            });
        }
    }

    fn collect_from_import(&mut self, stmt: Node) {
        let Some(module) = stmt.child_by_field_name("module_name") else {
            return;
        };
        let module = self.text(module).to_string();

        // wildcard imports carry no `name` field and bind nothing
        let mut cursor = stmt.walk();
        for name in stmt.children_by_field_name("name", &mut cursor) {
            let (imported, alias) = self.aliased(name);
            let source = match &alias {
                Some(alias) => format!("from {module} import {imported} as {alias}"),
                None => format!("from {module} import {imported}"),
            };
            self.decls.imports.push(ImportDecl {
                origin: Some(format!("{module}.{imported}")),
                binding: alias.unwrap_or_else(|| imported.clone()),
                source,
            });
        }
    }

    /// `name` or `name as alias`.
    fn aliased(&self, node: Node) -> (String, Option<String>) {
        if node.kind() == "aliased_import" {
            let name = node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default();
            let alias = node
                .child_by_field_name("alias")
                .map(|n| self.text(n).to_string());
            (name, alias)
        } else {
            (self.text(node).to_string(), None)
        }
    }

    /// Callee names of every call in the subtree: the identifier for `f()`,
    /// the rightmost attribute for `a.b.f()`. Other callee shapes are skipped.
    fn call_names(&self, node: Node) -> Vec<String> {
        let mut calls = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == "call" {
                if let Some(callee) = current.child_by_field_name("function") {
                    match callee.kind() {
                        "identifier" => calls.push(self.text(callee).to_string()),
                        "attribute" => {
                            if let Some(attr) = callee.child_by_field_name("attribute") {
                                calls.push(self.text(attr).to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            let mut cursor = current.walk();
            let children: Vec<Node> = current.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        calls
    }

    fn text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    /// Whole source lines from the declaration's first to its last line.
    fn span(&self, node: Node) -> String {
        let start = node.start_position().row;
        let end_pos = last_token(node).end_position();
        // a node ending at column 0 stops before that line
        let end = if end_pos.column == 0 && end_pos.row > start {
            end_pos.row
        } else {
            end_pos.row + 1
        };
        let end = end.min(self.lines.len());
        if start >= end {
            return String::new();
        }
        self.lines[start..end].join("\n")
    }
}

/// The function definition behind a statement, looking through decorators.
fn function_definition(node: Node) -> Option<Node> {
    match node.kind() {
        "function_definition" => Some(node),
        "decorated_definition" => node
            .child_by_field_name("definition")
            .filter(|def| def.kind() == "function_definition"),
        _ => None,
    }
}

/// The last token of a declaration. Trailing comments are attached to the
/// enclosing block by the grammar but do not belong to the declaration.
fn last_token(node: Node) -> Node {
    let mut current = node;
    loop {
        let mut cursor = current.walk();
        let last = current
            .children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .last();
        match last {
            Some(child) => current = child,
            None => return current,
        }
    }
}

/// First node that makes the source invalid Python 3: an error or missing
/// node, or a Python 2 `print` / `exec` statement the grammar still accepts.
fn first_invalid(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error()
            || node.is_missing()
            || matches!(node.kind(), "print_statement" | "exec_statement")
        {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
