use anyhow::{Context, Result};

use crate::api::dto::GraphDto;
use crate::config::GraphConfig;
use crate::domain::layout::PositionedGraph;
use crate::ports::GraphExporter;

/// Writes the rendering DTO as pretty JSON.
pub struct JsonExporter {
    pub config: GraphConfig,
}

impl JsonExporter {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }
}

impl GraphExporter for JsonExporter {
    fn render(&self, graph: &PositionedGraph) -> Result<String> {
        let dto = GraphDto::from_positioned(graph, &self.config);
        serde_json::to_string_pretty(&dto).context("Failed to serialize graph")
    }
}
