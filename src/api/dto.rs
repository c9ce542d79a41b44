use serde::{Deserialize, Serialize};

use crate::domain::graph::{CodeGraph, LinkKind, NodeKind};

/// Wire shape consumed by the diagram client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDto {
    #[serde(rename = "nodeDataArray")]
    pub nodes: Vec<NodeDto>,
    #[serde(rename = "linkDataArray")]
    pub links: Vec<LinkDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDto {
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    pub color: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDto {
    pub from: String,
    pub to: String,
    pub kind: LinkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub color: String,
}

pub fn node_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Type => "lightblue",
        NodeKind::Member => "lightgreen",
        NodeKind::Function => "lightcoral",
        NodeKind::Import => "lightyellow",
    }
}

pub fn link_color(kind: LinkKind) -> &'static str {
    match kind {
        LinkKind::Containment => "blue",
        LinkKind::Inheritance => "gray",
        LinkKind::Call => "green",
        LinkKind::ImportUse => "orange",
    }
}

impl From<&CodeGraph> for GraphDto {
    fn from(graph: &CodeGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|n| NodeDto {
                key: n.key.clone(),
                name: n.name.clone(),
                kind: n.kind,
                color: node_color(n.kind).to_string(),
                source: n.source_text.clone(),
            })
            .collect();

        let links = graph
            .links
            .iter()
            .map(|l| LinkDto {
                from: l.from.clone(),
                to: l.to.clone(),
                kind: l.kind,
                category: l.kind.is_dashed().then(|| "dashed".to_string()),
                color: link_color(l.kind).to_string(),
            })
            .collect();

        GraphDto { nodes, links }
    }
}
