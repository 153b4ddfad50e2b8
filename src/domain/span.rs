//! Span Data Structure
//!
//! Mirrors the stored span document: the span itself, its resource, and
//! fields computed at ingestion time (`externalFields`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute mapping, ordered by key so identity resolution is deterministic.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single attribute value as found in span/resource attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttributeValue {
    /// Empty strings, zero and `false` do not count as a present value.
    pub fn is_blank(&self) -> bool {
        match self {
            AttributeValue::Bool(b) => !b,
            AttributeValue::Int(i) => *i == 0,
            AttributeValue::Float(f) => *f == 0.0 || f.is_nan(),
            AttributeValue::Str(s) => s.is_empty(),
        }
    }

    /// Type name used when listing available tags.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "boolean",
            AttributeValue::Int(_) => "long",
            AttributeValue::Float(_) => "double",
            AttributeValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Str(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Int(i.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// A trace span together with its resource and ingestion-time fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub span: SpanData,
    #[serde(default)]
    pub resource: Resource,
    #[serde(default)]
    pub external_fields: ExternalFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanData {
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub status: SpanStatus,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_unix_nano: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_unix_nano: Option<u64>,
}

/// Status code 0 is success; anything else is an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalFields {
    /// Span duration in nanoseconds.
    #[serde(default)]
    pub duration: u64,
}

impl Span {
    pub fn new(span_id: impl Into<String>) -> Self {
        Self {
            span: SpanData {
                span_id: span_id.into(),
                parent_span_id: None,
                name: None,
                status: SpanStatus::default(),
                attributes: Attributes::new(),
                start_time_unix_nano: None,
                end_time_unix_nano: None,
            },
            resource: Resource::default(),
            external_fields: ExternalFields::default(),
        }
    }

    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.span.parent_span_id = Some(parent_span_id.into());
        self
    }

    /// Set `service.name` on the resource.
    pub fn with_service(self, service: &str) -> Self {
        self.with_resource_attribute("service.name", service)
    }

    pub fn with_status(mut self, code: i32) -> Self {
        self.span.status.code = code;
        self
    }

    pub fn with_duration(mut self, nanos: u64) -> Self {
        self.external_fields.duration = nanos;
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.span.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_resource_attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.resource.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_times(mut self, start: u64, end: u64) -> Self {
        self.span.start_time_unix_nano = Some(start);
        self.span.end_time_unix_nano = Some(end);
        self
    }

    pub fn span_id(&self) -> &str {
        &self.span.span_id
    }

    /// Parent span id; an empty string counts as a root span.
    pub fn parent_span_id(&self) -> Option<&str> {
        self.span
            .parent_span_id
            .as_deref()
            .filter(|p| !p.is_empty())
    }

    pub fn has_error(&self) -> bool {
        self.span.status.code != 0
    }

    pub fn duration(&self) -> u64 {
        self.external_fields.duration
    }

    /// Resource attributes overlaid with span attributes (span wins).
    pub fn merged_attributes(&self) -> Attributes {
        let mut merged = self.resource.attributes.clone();
        merged.extend(
            self.span
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }

    /// Look up a tag in the span attributes, then in the resource attributes.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.span
            .attributes
            .get(key)
            .or_else(|| self.resource.attributes.get(key))
    }
}
