//! Service Graph Data Structure
//!
//! Reduces a flat span list into one node per service/system and one edge
//! per (child node, parent node) pair.
//!
//! Built in two explicit passes:
//! 1. `aggregate_nodes` folds spans into nodes and records which node each
//!    span id landed in.
//! 2. `derive_edges` walks every span's parent pointer through that lookup.

use std::collections::HashMap;

use crate::domain::identity::{resolve_identity, IdentityPolicy, NodeIdentity, NodeKey};
use crate::domain::span::Span;
use crate::error::GraphError;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// A service (or database / broker) together with the spans attributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub key: NodeKey,
    /// Icon key for the renderer
    pub image: String,
    /// True iff any constituent span has a nonzero status code
    pub has_error: bool,
    /// Sum of constituent span durations (ns), saturating at `u64::MAX`
    pub duration: u64,
    /// Constituent spans in first-seen order
    pub spans: Vec<Span>,
}

impl GraphNode {
    fn seed(identity: NodeIdentity, span: &Span) -> Self {
        Self {
            key: identity.key,
            image: identity.image,
            has_error: span.has_error(),
            duration: span.duration(),
            spans: vec![span.clone()],
        }
    }

    fn merge(&mut self, span: &Span) {
        self.has_error |= span.has_error();
        self.duration = self.duration.saturating_add(span.duration());
        self.spans.push(span.clone());
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn system_type(&self) -> &str {
        &self.key.system_type
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration as f64 / NANOS_PER_MILLI
    }
}

/// Directional edge key: the child node first, then the node of its parent span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub child: NodeKey,
    pub parent: NodeKey,
}

/// Caller/callee relation between two nodes. Rendered parent -> child.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub key: EdgeKey,
    /// Number of child spans whose parent resolved to the parent node
    pub count: usize,
    /// Aggregate duration of the child node (ns)
    pub duration: u64,
    /// Error flag of the child node
    pub has_error: bool,
    /// Sum of the durations of the child spans behind this edge (ns)
    pub span_duration: u64,
}

impl GraphEdge {
    fn first(key: EdgeKey, child: &GraphNode, span: &Span) -> Self {
        Self {
            key,
            count: 1,
            duration: child.duration,
            has_error: child.has_error,
            span_duration: span.duration(),
        }
    }

    // Label and color stay at their first-seen values.
    fn record(&mut self, span: &Span) {
        self.count += 1;
        self.span_duration = self.span_duration.saturating_add(span.duration());
    }

    /// Rendered source: the parent node.
    pub fn source(&self) -> &NodeKey {
        &self.key.parent
    }

    /// Rendered target: the child node.
    pub fn target(&self) -> &NodeKey {
        &self.key.child
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration as f64 / NANOS_PER_MILLI
    }

    /// Label shown on the edge, e.g. `1.5ms`.
    pub fn time_label(&self) -> String {
        format!("{}ms", self.duration_ms())
    }
}

/// Output of the first pass: nodes plus the span id -> node lookup.
#[derive(Debug, Clone, Default)]
pub struct NodeAggregation {
    nodes: Vec<GraphNode>,
    span_index: HashMap<String, usize>,
}

impl NodeAggregation {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node_for_span(&self, span_id: &str) -> Option<&GraphNode> {
        self.span_index.get(span_id).map(|&idx| &self.nodes[idx])
    }

    pub fn into_nodes(self) -> Vec<GraphNode> {
        self.nodes
    }
}

/// The deduplicated service graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ServiceGraph {
    pub fn node(&self, key: &NodeKey) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.key == key)
    }

    pub fn edge(&self, child: &NodeKey, parent: &NodeKey) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|e| &e.key.child == child && &e.key.parent == parent)
    }

    pub fn span_count(&self) -> usize {
        self.nodes.iter().map(|n| n.spans.len()).sum()
    }
}

/// Fold spans into nodes, one per distinct identity.
pub fn aggregate_nodes(spans: &[Span], policy: IdentityPolicy) -> Result<NodeAggregation, GraphError> {
    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut node_index: HashMap<NodeKey, usize> = HashMap::new();
    let mut span_index: HashMap<String, usize> = HashMap::with_capacity(spans.len());

    for span in spans {
        let identity = resolve_identity(span, policy)?;
        let idx = match node_index.get(&identity.key) {
            Some(&idx) => {
                nodes[idx].merge(span);
                idx
            }
            None => {
                let idx = nodes.len();
                node_index.insert(identity.key.clone(), idx);
                nodes.push(GraphNode::seed(identity, span));
                idx
            }
        };

        if span_index.insert(span.span_id().to_string(), idx).is_some() {
            tracing::warn!(span_id = span.span_id(), "duplicate span id, later span wins the parent lookup");
        }
    }

    tracing::debug!(spans = spans.len(), nodes = nodes.len(), "aggregated nodes");
    Ok(NodeAggregation { nodes, span_index })
}

/// Derive one edge per (child node, parent node) pair.
pub fn derive_edges(aggregation: &NodeAggregation) -> Vec<GraphEdge> {
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut edge_index: HashMap<EdgeKey, usize> = HashMap::new();

    for child in aggregation.nodes() {
        for span in &child.spans {
            let Some(parent) = span
                .parent_span_id()
                .and_then(|parent_id| aggregation.node_for_span(parent_id))
            else {
                continue;
            };

            let key = EdgeKey {
                child: child.key.clone(),
                parent: parent.key.clone(),
            };
            match edge_index.get(&key) {
                Some(&idx) => edges[idx].record(span),
                None => {
                    edge_index.insert(key.clone(), edges.len());
                    edges.push(GraphEdge::first(key, child, span));
                }
            }
        }
    }

    tracing::debug!(edges = edges.len(), "derived edges");
    edges
}

/// Build the full service graph from a span list.
pub fn build_service_graph(spans: &[Span], policy: IdentityPolicy) -> Result<ServiceGraph, GraphError> {
    let aggregation = aggregate_nodes(spans, policy)?;
    let edges = derive_edges(&aggregation);
    Ok(ServiceGraph {
        nodes: aggregation.into_nodes(),
        edges,
    })
}
