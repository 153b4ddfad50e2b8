use std::path::Path;

use anyhow::{Context, Result};

use crate::config::GraphConfig;
use crate::domain::layout::{apply_layout, PositionedGraph};
use crate::domain::service_graph::build_service_graph;
use crate::domain::span::Span;
use crate::domain::tag_values::{available_tags, query_tag_values, TagInfo, TagValuesPage, TagValuesQuery};
use crate::error::GraphError;
use crate::ports::{GraphExporter, LayoutEngine, SpanSource};

/// Counts reported after a graph run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSummary {
    pub spans: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Spans -> service graph -> layout.
pub fn build_positioned_graph(
    spans: &[Span],
    layout: &dyn LayoutEngine,
    config: &GraphConfig,
) -> Result<PositionedGraph, GraphError> {
    let graph = build_service_graph(spans, config.identity.policy)?;
    apply_layout(graph, layout, &config.layout)
}

pub struct GraphUsecase<'a> {
    pub source: &'a dyn SpanSource,
    pub layout: &'a dyn LayoutEngine,
    pub exporter: &'a dyn GraphExporter,
    pub config: &'a GraphConfig,
}

impl<'a> GraphUsecase<'a> {
    pub fn run(&self, input: &Path, output: &Path) -> Result<GraphSummary> {
        let spans = self.source.load_spans(input)?;
        let graph = build_positioned_graph(&spans, self.layout, self.config)
            .context("Failed to build service graph")?;

        let summary = GraphSummary {
            spans: spans.len(),
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        };
        self.exporter
            .export(&graph, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        tracing::info!(
            spans = summary.spans,
            nodes = summary.nodes,
            edges = summary.edges,
            output = %output.display(),
            "service graph exported"
        );
        Ok(summary)
    }
}

pub struct TagValuesUsecase<'a> {
    pub source: &'a dyn SpanSource,
}

impl<'a> TagValuesUsecase<'a> {
    pub fn available_tags(&self, input: &Path) -> Result<Vec<TagInfo>> {
        let spans = self.source.load_spans(input)?;
        Ok(available_tags(&spans))
    }

    pub fn values(&self, input: &Path, query: &TagValuesQuery) -> Result<TagValuesPage> {
        let spans = self.source.load_spans(input)?;
        Ok(query_tag_values(&spans, query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::IdentityPolicy;
    use crate::infrastructure::{JsonExporter, TreeLayoutEngine};
    use std::path::Path;

    struct InMemorySource(Vec<Span>);

    impl SpanSource for InMemorySource {
        fn load_spans(&self, _path: &Path) -> Result<Vec<Span>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_graph_usecase_writes_output() {
        let source = InMemorySource(vec![
            Span::new("a").with_service("X"),
            Span::new("b").with_parent("a").with_service("Y"),
            Span::new("c").with_parent("a").with_service("Y"),
        ]);
        let config = GraphConfig::default();
        let exporter = JsonExporter::new(config.clone());
        let layout = TreeLayoutEngine::new(&config.layout);
        let usecase = GraphUsecase {
            source: &source,
            layout: &layout,
            exporter: &exporter,
            config: &config,
        };

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("graph.json");
        let summary = usecase.run(Path::new("ignored"), &output).unwrap();
        assert_eq!(
            summary,
            GraphSummary {
                spans: 3,
                nodes: 2,
                edges: 1
            }
        );
        assert!(output.exists());
    }

    #[test]
    fn test_strict_config_surfaces_identity_error() {
        let mut config = GraphConfig::default();
        config.identity.policy = IdentityPolicy::Strict;
        let spans = vec![Span::new("a")];
        let err = build_positioned_graph(&spans, &TreeLayoutEngine::default(), &config).unwrap_err();
        assert!(matches!(err, GraphError::UnresolvableIdentity { .. }));
    }

    #[test]
    fn test_tag_values_usecase() {
        let source = InMemorySource(vec![
            Span::new("a").with_attribute("http.method", "GET"),
            Span::new("b").with_attribute("http.method", "GET"),
        ]);
        let usecase = TagValuesUsecase { source: &source };
        let tags = usecase.available_tags(Path::new("ignored")).unwrap();
        assert_eq!(tags.len(), 1);

        let page = usecase
            .values(Path::new("ignored"), &TagValuesQuery::new("http.method"))
            .unwrap();
        assert_eq!(page.values[0].occurrences, 2);
    }
}
