//! Top-down tree layout.
//!
//! Roots (nodes without an incoming edge) sit on the first row, each child
//! one row below its BFS parent. Leaves are packed left to right and every
//! parent is centered above its children. Cycles are broken by BFS order.

use std::collections::{HashMap, VecDeque};

use crate::config::LayoutConfig;
use crate::domain::layout::{LayoutGraph, LayoutPositions, Point};
use crate::error::GraphError;
use crate::ports::LayoutEngine;

pub struct TreeLayoutEngine {
    node_spacing: f64,
    layer_spacing: f64,
}

impl TreeLayoutEngine {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            node_spacing: config.node_spacing,
            layer_spacing: config.layer_spacing,
        }
    }
}

impl Default for TreeLayoutEngine {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

/// BFS spanning forest over the layout graph.
struct Forest {
    roots: Vec<usize>,
    /// Every node in BFS visit order; parents precede their children.
    order: Vec<usize>,
    children: Vec<Vec<usize>>,
    depth: Vec<usize>,
    widths: Vec<f64>,
}

impl LayoutEngine for TreeLayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Result<LayoutPositions, GraphError> {
        let n = graph.nodes.len();
        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut has_parent = vec![false; n];
        for edge in &graph.edges {
            for source in &edge.sources {
                for target in &edge.targets {
                    let (Some(&s), Some(&t)) = (index.get(source.as_str()), index.get(target.as_str()))
                    else {
                        return Err(GraphError::Layout(format!(
                            "edge {} references an unknown node",
                            edge.id
                        )));
                    };
                    if s != t {
                        adjacency[s].push(t);
                        has_parent[t] = true;
                    }
                }
            }
        }

        let mut forest = Forest {
            roots: Vec::new(),
            order: Vec::with_capacity(n),
            children: vec![Vec::new(); n],
            depth: vec![0; n],
            widths: vec![0.0; n],
        };
        let mut visited = vec![false; n];

        // Real roots first, then whatever a cycle kept unreachable.
        let starts = (0..n).filter(|&i| !has_parent[i]).chain(0..n);
        for start in starts {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            forest.roots.push(start);

            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                forest.order.push(current);
                for &child in &adjacency[current] {
                    if !visited[child] {
                        visited[child] = true;
                        forest.depth[child] = forest.depth[current] + 1;
                        forest.children[current].push(child);
                        queue.push_back(child);
                    }
                }
            }
        }

        self.measure(graph, &mut forest);

        let row_height = graph
            .nodes
            .iter()
            .map(|node| node.height)
            .fold(0.0, f64::max);

        let positions = self.place(row_height, graph, &forest);

        tracing::debug!(nodes = n, roots = forest.roots.len(), "tree layout computed");
        Ok(positions)
    }
}

impl TreeLayoutEngine {
    /// Subtree widths, children before parents. Walking the BFS order
    /// backwards keeps this free of recursion, so chain depth is unbounded.
    fn measure(&self, graph: &LayoutGraph, forest: &mut Forest) {
        for &node in forest.order.iter().rev() {
            let children = &forest.children[node];
            let total = self.row_width(children, &forest.widths);
            forest.widths[node] = graph.nodes[node].width.max(total);
        }
    }

    fn row_width(&self, children: &[usize], widths: &[f64]) -> f64 {
        if children.is_empty() {
            return 0.0;
        }
        children.iter().map(|&c| widths[c]).sum::<f64>()
            + self.node_spacing * (children.len() - 1) as f64
    }

    fn place(&self, row_height: f64, graph: &LayoutGraph, forest: &Forest) -> LayoutPositions {
        let mut positions = LayoutPositions::with_capacity(graph.nodes.len());

        let mut stack = Vec::with_capacity(forest.roots.len());
        let mut left = 0.0;
        for &root in &forest.roots {
            stack.push((root, left));
            left += forest.widths[root] + self.node_spacing;
        }

        while let Some((node, left)) = stack.pop() {
            let width = forest.widths[node];
            positions.insert(
                graph.nodes[node].id.clone(),
                Point {
                    x: left + width / 2.0,
                    y: forest.depth[node] as f64 * (row_height + self.layer_spacing)
                        + row_height / 2.0,
                },
            );

            let children = &forest.children[node];
            let mut cursor = left + (width - self.row_width(children, &forest.widths)) / 2.0;
            for &child in children {
                stack.push((child, cursor));
                cursor += forest.widths[child] + self.node_spacing;
            }
        }

        positions
    }
}
