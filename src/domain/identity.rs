/// Node Identity Module
///
/// Decides which graph node a span belongs to. A span talking to a database
/// or a broker is attributed to that system; every other span is attributed
/// to its service.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::span::{Attributes, Span};
use crate::error::GraphError;

pub const SERVICE_NAME_KEY: &str = "service.name";
pub const SERVICE_TYPE: &str = "service";
pub const UNKNOWN_NAME: &str = "unknown";

/// System marker keys and the attributes naming the concrete system, in
/// lookup order.
pub const SYSTEM_MARKERS: &[(&str, &[&str])] = &[
    ("db.system", &["db.name", "net.peer.name"]),
    ("messaging.system", &["messaging.destination"]),
];

/// Composite node key. Kept structured so that ("AB", "C") and ("A", "BC")
/// stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub name: String,
    pub system_type: String,
}

impl NodeKey {
    pub fn new(name: impl Into<String>, system_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_type: system_type.into(),
        }
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::new(name, SERVICE_TYPE)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.system_type)
    }
}

/// Resolved identity: the key plus the icon to render it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub key: NodeKey,
    /// Icon key; the system marker value, empty for plain services.
    pub image: String,
}

/// What to do when neither a system target nor `service.name` is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Attribute the span to a node named `unknown`.
    #[default]
    Unknown,
    /// Fail with `GraphError::UnresolvableIdentity`.
    Strict,
}

/// Resolve the node identity of a span from its merged attributes.
pub fn resolve_identity(span: &Span, policy: IdentityPolicy) -> Result<NodeIdentity, GraphError> {
    resolve_from_attributes(span.span_id(), &span.merged_attributes(), policy)
}

pub fn resolve_from_attributes(
    span_id: &str,
    attributes: &Attributes,
    policy: IdentityPolicy,
) -> Result<NodeIdentity, GraphError> {
    let present = |key: &str| {
        attributes
            .get(key)
            .filter(|v| !v.is_blank())
            .map(ToString::to_string)
    };

    let marker = SYSTEM_MARKERS
        .iter()
        .find_map(|(marker, targets)| present(*marker).map(|system| (system, *targets)));

    let (name, system_type, image) = match marker {
        Some((system, targets)) => {
            let name = targets.iter().find_map(|t| present(*t));
            (name, system.clone(), system)
        }
        None => (present(SERVICE_NAME_KEY), SERVICE_TYPE.to_string(), String::new()),
    };

    let name = match (name, policy) {
        (Some(name), _) => name,
        (None, IdentityPolicy::Unknown) => UNKNOWN_NAME.to_string(),
        (None, IdentityPolicy::Strict) => {
            return Err(GraphError::UnresolvableIdentity {
                span_id: span_id.to_string(),
            })
        }
    };

    Ok(NodeIdentity {
        key: NodeKey::new(name, system_type),
        image,
    })
}
