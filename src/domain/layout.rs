//! Layout Adapter
//!
//! Hands the service graph to a `LayoutEngine` and converts the centers it
//! returns into top-left anchored boxes for the renderer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::domain::service_graph::{GraphEdge, GraphNode, ServiceGraph};
use crate::error::GraphError;
use crate::ports::LayoutEngine;

/// Node as seen by the layout engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// Edge as seen by the layout engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub id: String,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node id -> center point.
pub type LayoutPositions = HashMap<String, Point>;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: String,
    pub node: GraphNode,
    /// Top-left corner
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedEdge {
    pub id: String,
    /// Id of the parent node
    pub source: String,
    /// Id of the child node
    pub target: String,
    pub edge: GraphEdge,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionedGraph {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
}

impl PositionedGraph {
    /// Nodes grouped by vertical position, top row first.
    pub fn nodes_by_row(&self) -> Vec<Vec<&PositionedNode>> {
        let mut rows: BTreeMap<i64, Vec<&PositionedNode>> = BTreeMap::new();
        for node in &self.nodes {
            rows.entry(node.position.y.round() as i64).or_default().push(node);
        }
        rows.into_values().collect()
    }
}

/// Convert a layout center into the top-left corner of a `width` x `height` box.
pub fn top_left(center: Point, width: f64, height: f64) -> Point {
    Point {
        x: center.x - width / 2.0,
        y: center.y - height / 2.0,
    }
}

pub fn node_id(index: usize) -> String {
    format!("n{}", index)
}

pub fn edge_id(index: usize) -> String {
    format!("e{}", index)
}

/// Lay out `graph` with `engine`. Nodes the engine leaves out stay at the origin.
pub fn apply_layout(
    graph: ServiceGraph,
    engine: &dyn LayoutEngine,
    config: &LayoutConfig,
) -> Result<PositionedGraph, GraphError> {
    let ids: HashMap<_, _> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.key.clone(), node_id(i)))
        .collect();

    let mut edges = Vec::with_capacity(graph.edges.len());
    for (i, edge) in graph.edges.into_iter().enumerate() {
        let (Some(source), Some(target)) = (ids.get(edge.source()), ids.get(edge.target())) else {
            return Err(GraphError::Layout(format!(
                "edge {} -> {} references a node outside the graph",
                edge.source(),
                edge.target()
            )));
        };
        edges.push(PositionedEdge {
            id: edge_id(i),
            source: source.clone(),
            target: target.clone(),
            edge,
        });
    }

    let request = LayoutGraph {
        nodes: (0..graph.nodes.len())
            .map(|i| LayoutNode {
                id: node_id(i),
                width: config.node_width,
                height: config.node_height,
            })
            .collect(),
        edges: edges
            .iter()
            .map(|e| LayoutEdge {
                id: e.id.clone(),
                sources: vec![e.source.clone()],
                targets: vec![e.target.clone()],
            })
            .collect(),
    };

    let centers = engine.layout(&request)?;

    let nodes = graph
        .nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| {
            let id = node_id(i);
            let position = match centers.get(&id) {
                Some(&center) => top_left(center, config.node_width, config.node_height),
                None => {
                    tracing::debug!(node = %node.key, "layout engine left node unplaced");
                    Point::default()
                }
            };
            PositionedNode {
                id,
                node,
                position,
                width: config.node_width,
                height: config.node_height,
            }
        })
        .collect();

    Ok(PositionedGraph { nodes, edges })
}
