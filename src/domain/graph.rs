// Declaration graph structures for Codegraph.
// Nodes are declarations in one source file, links are the relations between them.

use serde::{Deserialize, Serialize};

/// Semantic category of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Type,
    Member,
    Function,
    Import,
}

/// One syntactic unit of interest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationNode {
    /// `Owner.member` for members, the bare name otherwise.
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    /// Verbatim source lines spanning the declaration.
    pub source_text: String,
}

impl DeclarationNode {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        kind: NodeKind,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            kind,
            source_text: source_text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    /// type -> member
    Containment,
    /// subtype -> supertype
    Inheritance,
    /// caller -> callee
    Call,
    /// caller -> imported symbol
    ImportUse,
}

impl LinkKind {
    /// Everything except containment is drawn dashed.
    pub fn is_dashed(&self) -> bool {
        !matches!(self, LinkKind::Containment)
    }
}

/// Directed relation between two declaration keys. Not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub from: String,
    pub to: String,
    pub kind: LinkKind,
}

impl Link {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

/// The graph for a single file, recomputed on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGraph {
    pub nodes: Vec<DeclarationNode>,
    pub links: Vec<Link>,
}

impl CodeGraph {
    pub fn new(nodes: Vec<DeclarationNode>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub fn node(&self, key: &str) -> Option<&DeclarationNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &DeclarationNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.kind == kind)
    }

    pub fn has_link(&self, from: &str, to: &str, kind: LinkKind) -> bool {
        self.links
            .iter()
            .any(|l| l.from == from && l.to == to && l.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_containment_is_solid() {
        assert!(!LinkKind::Containment.is_dashed());
        assert!(LinkKind::Inheritance.is_dashed());
        assert!(LinkKind::Call.is_dashed());
        assert!(LinkKind::ImportUse.is_dashed());
    }

    #[test]
    fn link_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&LinkKind::ImportUse).unwrap();
        assert_eq!(json, "\"import-use\"");
    }

    #[test]
    fn lookup_by_key_and_kind() {
        let graph = CodeGraph::new(
            vec![
                DeclarationNode::new("Foo", "Foo", NodeKind::Type, "class Foo:"),
                DeclarationNode::new("Foo.bar", "bar", NodeKind::Member, "def bar(self):"),
            ],
            vec![Link::new("Foo", "Foo.bar", LinkKind::Containment)],
        );
        assert_eq!(graph.node("Foo.bar").map(|n| n.kind), Some(NodeKind::Member));
        assert_eq!(graph.nodes_of(NodeKind::Type).count(), 1);
        assert!(graph.has_link("Foo", "Foo.bar", LinkKind::Containment));
        assert!(!graph.has_link("Foo.bar", "Foo", LinkKind::Containment));
    }
}
