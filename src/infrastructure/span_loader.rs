use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::span::Span;
use crate::ports::SpanSource;

/// Reads spans from a JSON file: an array, `{ "spans": [...] }`, or one span per line.
pub struct JsonSpanLoader;

#[derive(Deserialize)]
struct SpanBatch {
    spans: Vec<Span>,
}

impl SpanSource for JsonSpanLoader {
    fn load_spans(&self, path: &Path) -> Result<Vec<Span>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read span file {}", path.display()))?;
        let spans = parse_spans(&content)
            .with_context(|| format!("Invalid span file {}", path.display()))?;
        tracing::info!(path = %path.display(), spans = spans.len(), "loaded spans");
        Ok(spans)
    }
}

pub fn parse_spans(content: &str) -> Result<Vec<Span>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse span array");
    }
    if let Ok(batch) = serde_json::from_str::<SpanBatch>(trimmed) {
        return Ok(batch.spans);
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Failed to parse span on line {}", i + 1))
        })
        .collect()
}
