//! Graph exporters
//!
//! JSON in the diagram client's wire shape, and Graphviz DOT for offline viewing.

use crate::api::dto::{link_color, node_color, GraphDto};
use crate::domain::graph::{CodeGraph, NodeKind};
use crate::error::{CodegraphError, Result};
use crate::ports::OutputExporter;

pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OutputExporter for JsonExporter {
    fn render(&self, graph: &CodeGraph) -> Result<String> {
        let dto = GraphDto::from(graph);
        let json = if self.pretty {
            serde_json::to_string_pretty(&dto)
        } else {
            serde_json::to_string(&dto)
        };
        json.map_err(|e| CodegraphError::Io(e.into()))
    }
}

pub struct DotExporter;

impl DotExporter {
    pub fn to_dot(graph: &CodeGraph) -> String {
        let mut lines = vec![
            "digraph CodeGraph {".to_string(),
            "    rankdir=LR;".to_string(),
            "    node [fontname=\"Helvetica\", fontsize=12, style=filled];".to_string(),
            "    edge [fontname=\"Helvetica\", fontsize=10];".to_string(),
            String::new(),
        ];

        for node in &graph.nodes {
            lines.push(format!(
                "    \"{}\" [label=\"{}\", shape={}, fillcolor=\"{}\"];",
                escape(&node.key),
                escape(&node.name),
                shape(node.kind),
                node_color(node.kind)
            ));
        }

        lines.push(String::new());

        for link in &graph.links {
            let style = if link.kind.is_dashed() { "dashed" } else { "solid" };
            lines.push(format!(
                "    \"{}\" -> \"{}\" [color=\"{}\", style={}];",
                escape(&link.from),
                escape(&link.to),
                link_color(link.kind),
                style
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl OutputExporter for DotExporter {
    fn render(&self, graph: &CodeGraph) -> Result<String> {
        Ok(Self::to_dot(graph))
    }
}

fn shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Type => "box",
        NodeKind::Member | NodeKind::Function => "ellipse",
        NodeKind::Import => "note",
    }
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
