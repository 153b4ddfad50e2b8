/// Service graph properties checked end to end through the public API.

use std::collections::{HashMap, HashSet};

use trace_graph::domain::identity::{resolve_identity, IdentityPolicy, NodeKey};
use trace_graph::domain::service_graph::build_service_graph;
use trace_graph::domain::span::Span;

/// A small checkout trace: gateway -> orders -> (postgres, kafka), gateway -> users.
fn checkout_trace() -> Vec<Span> {
    vec![
        Span::new("1").with_service("gateway").with_duration(10_000_000),
        Span::new("2").with_parent("1").with_service("orders").with_duration(6_000_000),
        Span::new("3")
            .with_parent("2")
            .with_service("orders")
            .with_attribute("db.system", "postgresql")
            .with_attribute("db.name", "orders")
            .with_duration(2_000_000),
        Span::new("4")
            .with_parent("2")
            .with_service("orders")
            .with_attribute("db.system", "postgresql")
            .with_attribute("db.name", "orders")
            .with_status(13)
            .with_duration(1_000_000),
        Span::new("5")
            .with_parent("2")
            .with_service("orders")
            .with_attribute("messaging.system", "kafka")
            .with_attribute("messaging.destination", "order-events")
            .with_duration(500_000),
        Span::new("6").with_parent("1").with_service("users").with_duration(3_000_000),
        Span::new("7").with_parent("6").with_service("users").with_duration(1_000_000),
        Span::new("8").with_parent("gone").with_service("users"),
    ]
}

#[test]
fn scenario_two_children_one_edge() {
    let spans = vec![
        Span::new("a").with_service("X"),
        Span::new("b").with_parent("a").with_service("Y"),
        Span::new("c").with_parent("a").with_service("Y"),
    ];
    let graph = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    let edge = graph
        .edge(&NodeKey::service("Y"), &NodeKey::service("X"))
        .expect("Y -> X edge");
    assert_eq!(edge.count, 2);
}

#[test]
fn scenario_error_status_taints_node() {
    let spans = vec![
        Span::new("a").with_service("X"),
        Span::new("b").with_service("X").with_status(5),
        Span::new("c").with_service("X"),
    ];
    let graph = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();
    assert!(graph.node(&NodeKey::service("X")).unwrap().has_error);
}

#[test]
fn node_count_matches_distinct_identities() {
    let spans = checkout_trace();
    let graph = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();

    let identities: HashSet<NodeKey> = spans
        .iter()
        .map(|s| resolve_identity(s, IdentityPolicy::Strict).unwrap().key)
        .collect();
    assert_eq!(graph.nodes.len(), identities.len());
    assert_eq!(graph.nodes.len(), 5);
    assert_eq!(graph.span_count(), spans.len());
}

#[test]
fn node_aggregates_are_or_and_sum() {
    let spans = checkout_trace();
    let graph = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();

    for node in &graph.nodes {
        let members: Vec<&Span> = spans
            .iter()
            .filter(|s| resolve_identity(s, IdentityPolicy::Strict).unwrap().key == node.key)
            .collect();
        assert_eq!(node.has_error, members.iter().any(|s| s.has_error()));
        assert_eq!(node.duration, members.iter().map(|s| s.duration()).sum::<u64>());
    }

    let db = graph.node(&NodeKey::new("orders", "postgresql")).unwrap();
    assert!(db.has_error);
    assert_eq!(db.duration, 3_000_000);
}

#[test]
fn edge_counts_match_parent_links() {
    let spans = checkout_trace();
    let graph = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();

    let by_id: HashMap<&str, NodeKey> = spans
        .iter()
        .map(|s| (s.span_id(), resolve_identity(s, IdentityPolicy::Strict).unwrap().key))
        .collect();
    let mut expected: HashMap<(NodeKey, NodeKey), usize> = HashMap::new();
    for span in &spans {
        if let Some(parent) = span.parent_span_id().and_then(|p| by_id.get(p)) {
            *expected
                .entry((by_id[span.span_id()].clone(), parent.clone()))
                .or_default() += 1;
        }
    }

    assert_eq!(graph.edges.len(), expected.len());
    for edge in &graph.edges {
        let key = (edge.key.child.clone(), edge.key.parent.clone());
        assert_eq!(edge.count, expected[&key], "count for {:?}", key);
    }

    // users -> users from span 7, orphan span 8 adds nothing
    let users = NodeKey::service("users");
    assert_eq!(graph.edge(&users, &users).unwrap().count, 1);
    assert_eq!(
        graph
            .edge(&NodeKey::new("orders", "postgresql"), &NodeKey::service("orders"))
            .unwrap()
            .count,
        2
    );
}

#[test]
fn rebuilding_is_set_equal() {
    let spans = checkout_trace();
    let first = build_service_graph(&spans, IdentityPolicy::Unknown).unwrap();
    let second = build_service_graph(&spans, IdentityPolicy::Unknown).unwrap();

    let nodes = |g: &trace_graph::domain::service_graph::ServiceGraph| {
        g.nodes
            .iter()
            .map(|n| (n.key.clone(), n.has_error, n.duration, n.spans.len()))
            .collect::<HashSet<_>>()
    };
    let edges = |g: &trace_graph::domain::service_graph::ServiceGraph| {
        g.edges
            .iter()
            .map(|e| (e.key.clone(), e.count, e.duration, e.has_error))
            .collect::<HashSet<_>>()
    };
    assert_eq!(nodes(&first), nodes(&second));
    assert_eq!(edges(&first), edges(&second));
}

#[test]
fn aggregates_do_not_depend_on_input_order() {
    let spans = checkout_trace();
    let mut reversed = spans.clone();
    reversed.reverse();

    let forward = build_service_graph(&spans, IdentityPolicy::Strict).unwrap();
    let backward = build_service_graph(&reversed, IdentityPolicy::Strict).unwrap();

    for node in &forward.nodes {
        let other = backward.node(&node.key).unwrap();
        assert_eq!(node.has_error, other.has_error);
        assert_eq!(node.duration, other.duration);
    }
    for edge in &forward.edges {
        let other = backward.edge(&edge.key.child, &edge.key.parent).unwrap();
        assert_eq!(edge.count, other.count);
    }
}
