//! Tag Values
//!
//! Lists the attribute keys present on a span set and counts the distinct
//! values of requested tags. Backs the search filter panel: one page of
//! `{ value, occurrences }` per request, optionally narrowed by a substring.

use std::collections::BTreeMap;

use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::span::{AttributeValue, Span};
use crate::error::GraphError;

/// Prefix of span attribute fields in the stored document.
pub const SPAN_ATTRIBUTES_PREFIX: &str = "span.attributes.";

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Inclusive time window in unix nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeframe {
    pub start_time: u64,
    pub end_time: u64,
}

impl Timeframe {
    /// A span matches when it starts and ends inside the window. Spans
    /// without timestamps never match.
    pub fn contains(&self, span: &Span) -> bool {
        match (span.span.start_time_unix_nano, span.span.end_time_unix_nano) {
            (Some(start), Some(end)) => start >= self.start_time && end <= self.end_time,
            _ => false,
        }
    }
}

/// Filter applied before counting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagValuesRequest {
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
}

impl TagValuesRequest {
    fn matches(&self, span: &Span) -> bool {
        self.timeframe.map_or(true, |tf| tf.contains(span))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagValueInfo {
    pub value: AttributeValue,
    pub occurrences: usize,
}

/// One page of values for a single tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagValuesQuery {
    pub tag: String,
    #[serde(default)]
    pub query: TagValuesRequest,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl TagValuesQuery {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            query: TagValuesRequest::default(),
            search: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagValuesPage {
    pub tag: String,
    pub values: Vec<TagValueInfo>,
    pub page: usize,
    pub next_page: Option<usize>,
    /// Matching values across all pages
    pub total: usize,
}

fn strip_prefix(tag: &str) -> &str {
    tag.strip_prefix(SPAN_ATTRIBUTES_PREFIX).unwrap_or(tag)
}

/// All span attribute keys, prefixed like the stored document fields.
pub fn available_tags(spans: &[Span]) -> Vec<TagInfo> {
    let mut tags: BTreeMap<&str, &'static str> = BTreeMap::new();
    for span in spans {
        for (key, value) in &span.span.attributes {
            tags.entry(key.as_str()).or_insert_with(|| value.kind());
        }
    }
    tags.into_iter()
        .map(|(key, kind)| TagInfo {
            name: format!("{}{}", SPAN_ATTRIBUTES_PREFIX, key),
            kind: kind.to_string(),
        })
        .collect()
}

/// Count distinct values of every tag in `tags` over the spans matching `request`.
///
/// Values are ordered by occurrences (descending), then by their display form.
/// Tags with no value on any matching span are left out.
pub fn tag_values(
    spans: &[Span],
    tags: &[String],
    request: &TagValuesRequest,
) -> BTreeMap<String, Vec<TagValueInfo>> {
    // (tag, display form) -> (value, occurrences)
    let counts: DashMap<(String, String), (AttributeValue, usize)> = DashMap::new();

    spans
        .par_iter()
        .filter(|span| request.matches(span))
        .for_each(|span| {
            for tag in tags {
                if let Some(value) = span.attribute(strip_prefix(tag)) {
                    counts
                        .entry((tag.clone(), value.to_string()))
                        .or_insert_with(|| (value.clone(), 0))
                        .1 += 1;
                }
            }
        });

    let mut result: BTreeMap<String, Vec<(String, TagValueInfo)>> = BTreeMap::new();
    for ((tag, display), (value, occurrences)) in counts.into_iter() {
        result
            .entry(tag)
            .or_default()
            .push((display, TagValueInfo { value, occurrences }));
    }

    result
        .into_iter()
        .map(|(tag, mut values)| {
            values.sort_by(|(da, a), (db, b)| b.occurrences.cmp(&a.occurrences).then_with(|| da.cmp(db)));
            (tag, values.into_iter().map(|(_, info)| info).collect())
        })
        .collect()
}

/// Answer one paged, optionally searched, tag-value query.
pub fn query_tag_values(spans: &[Span], query: &TagValuesQuery) -> Result<TagValuesPage, GraphError> {
    if query.page_size == 0 {
        return Err(GraphError::InvalidQuery("page size must be positive".to_string()));
    }
    if query.tag.is_empty() {
        return Err(GraphError::InvalidQuery("tag must not be empty".to_string()));
    }

    let mut all = tag_values(spans, std::slice::from_ref(&query.tag), &query.query)
        .remove(&query.tag)
        .unwrap_or_default();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        all.retain(|info| info.value.to_string().contains(search));
    }

    let total = all.len();
    let start = query.page.saturating_mul(query.page_size).min(total);
    let end = start.saturating_add(query.page_size).min(total);
    let values = all[start..end].to_vec();
    let next_page = (end < total).then_some(query.page + 1);

    Ok(TagValuesPage {
        tag: query.tag.clone(),
        values,
        page: query.page,
        next_page,
        total,
    })
}
