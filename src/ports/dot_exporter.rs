//! Service Graph DOT Exporter
//!
//! Exports a positioned service graph as Graphviz DOT, parents on top.

use crate::config::Palette;
use crate::domain::layout::PositionedGraph;
use crate::ports::GraphExporter;

pub struct DotExporter {
    pub palette: Palette,
}

impl DotExporter {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    /// Convert a positioned graph to a DOT string.
    pub fn to_dot(&self, graph: &PositionedGraph) -> String {
        let mut lines = Vec::new();

        lines.push("digraph ServiceGraph {".to_string());
        lines.push("    rankdir=TB;".to_string());
        lines.push("    nodesep=0.8;".to_string());
        lines.push("    ranksep=1.0;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12, shape=box, style=\"filled,rounded\"];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10, arrowhead=normal];".to_string());
        lines.push("".to_string());

        for positioned in &graph.nodes {
            let node = &positioned.node;
            let label = format!(
                "{}\\n{}",
                Self::escape_label(node.name()),
                Self::escape_label(node.system_type())
            );
            lines.push(format!(
                "    \"{}\" [label=\"{}\", color=\"{}\", fillcolor=\"#1B1C21\", fontcolor=\"#E9EAF1\"];",
                positioned.id,
                label,
                self.palette.node_color(node.has_error)
            ));
        }

        lines.push("".to_string());

        for positioned in &graph.edges {
            let edge = &positioned.edge;
            lines.push(format!(
                "    \"{}\" -> \"{}\" [label=\"{} x{}\", color=\"{}\"];",
                positioned.source,
                positioned.target,
                edge.time_label(),
                edge.count,
                self.palette.edge_color(edge.has_error)
            ));
        }

        // Keep the computed rows
        for row in graph.nodes_by_row() {
            if row.len() > 1 {
                let ids: Vec<String> = row.iter().map(|n| format!("\"{}\"", n.id)).collect();
                lines.push(format!("    {{ rank=same; {} }}", ids.join("; ")));
            }
        }

        lines.push("}".to_string());

        lines.join("\n")
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl GraphExporter for DotExporter {
    fn render(&self, graph: &PositionedGraph) -> anyhow::Result<String> {
        Ok(self.to_dot(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::domain::identity::IdentityPolicy;
    use crate::domain::layout::apply_layout;
    use crate::domain::service_graph::build_service_graph;
    use crate::domain::span::Span;
    use crate::infrastructure::TreeLayoutEngine;

    #[test]
    fn test_to_dot() {
        let spans = vec![
            Span::new("a").with_service("gateway"),
            Span::new("b").with_parent("a").with_service("orders"),
            Span::new("c").with_parent("a").with_service("users\"db"),
        ];
        let graph = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();
        let positioned =
            apply_layout(graph, &TreeLayoutEngine::default(), &LayoutConfig::default()).unwrap();

        let dot = DotExporter::new(Palette::default()).to_dot(&positioned);
        assert!(dot.contains("digraph ServiceGraph"));
        assert!(dot.contains("rankdir=TB"));
        assert!(dot.contains("label=\"gateway\\nservice\""));
        assert!(dot.contains("users\\\"db"));
        assert!(dot.contains("\"n0\" -> \"n1\" [label=\"0ms x1\""));
        assert!(dot.contains("{ rank=same; \"n1\"; \"n2\" }"));
    }
}
