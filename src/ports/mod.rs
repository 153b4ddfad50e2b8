use std::path::Path;

use crate::domain::layout::{LayoutGraph, LayoutPositions, PositionedGraph};
use crate::domain::span::Span;
use crate::error::GraphError;

pub mod dot_exporter;

/// Where spans come from.
pub trait SpanSource {
    fn load_spans(&self, path: &Path) -> anyhow::Result<Vec<Span>>;
}

/// Hierarchical layout engine. Returns the **center** of every node it placed.
pub trait LayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Result<LayoutPositions, GraphError>;
}

pub trait GraphExporter {
    fn render(&self, graph: &PositionedGraph) -> anyhow::Result<String>;

    fn export(&self, graph: &PositionedGraph, path: &Path) -> anyhow::Result<()> {
        let content = self.render(graph)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
