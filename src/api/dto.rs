use serde::{Deserialize, Serialize};

use crate::config::GraphConfig;
use crate::domain::layout::{Point, PositionedEdge, PositionedGraph, PositionedNode};

pub const BASIC_NODE_TYPE: &str = "basic";
pub const BASIC_EDGE_TYPE: &str = "basic";
pub const ARROW_CLOSED: &str = "arrowclosed";

/// Graph in the shape the rendering layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: NodeDataDto,
    pub position: Point,
    pub source_position: String,
    pub target_position: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub image: String,
    pub color: String,
    pub has_error: bool,
    /// Aggregate duration (ns)
    pub duration: u64,
    pub span_count: usize,
    pub span_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDto {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub source: String,
    pub target: String,
    pub data: EdgeDataDto,
    pub style: EdgeStyleDto,
    pub marker_end: MarkerDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDataDto {
    pub time: String,
    pub count: usize,
    /// Sum of the child span durations behind this edge (ns)
    pub span_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyleDto {
    pub stroke: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDto {
    #[serde(rename = "type")]
    pub type_: String,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl GraphDto {
    pub fn from_positioned(graph: &PositionedGraph, config: &GraphConfig) -> Self {
        GraphDto {
            nodes: graph.nodes.iter().map(|n| NodeDto::new(n, config)).collect(),
            edges: graph.edges.iter().map(|e| EdgeDto::new(e, config)).collect(),
        }
    }
}

impl NodeDto {
    fn new(positioned: &PositionedNode, config: &GraphConfig) -> Self {
        let node = &positioned.node;
        NodeDto {
            id: positioned.id.clone(),
            type_: BASIC_NODE_TYPE.to_string(),
            data: NodeDataDto {
                id: positioned.id.clone(),
                name: node.name().to_string(),
                type_: node.system_type().to_string(),
                image: node.image.clone(),
                color: config.palette.node_color(node.has_error).to_string(),
                has_error: node.has_error,
                duration: node.duration,
                span_count: node.spans.len(),
                span_ids: node.spans.iter().map(|s| s.span_id().to_string()).collect(),
            },
            position: positioned.position,
            source_position: "top".to_string(),
            target_position: "bottom".to_string(),
            width: positioned.width,
            height: positioned.height,
        }
    }
}

impl EdgeDto {
    fn new(positioned: &PositionedEdge, config: &GraphConfig) -> Self {
        let edge = &positioned.edge;
        let color = config.palette.edge_color(edge.has_error).to_string();
        let arrow = config.layout.edge_arrow_size;
        EdgeDto {
            id: positioned.id.clone(),
            type_: BASIC_EDGE_TYPE.to_string(),
            source: positioned.source.clone(),
            target: positioned.target.clone(),
            data: EdgeDataDto {
                time: edge.time_label(),
                count: edge.count,
                span_duration: edge.span_duration,
            },
            style: EdgeStyleDto {
                stroke: color.clone(),
            },
            marker_end: MarkerDto {
                type_: ARROW_CLOSED.to_string(),
                width: arrow,
                height: arrow,
                color,
            },
        }
    }
}
