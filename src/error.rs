/// Errors raised by the graph builder, the layout step and tag queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("cannot resolve a node identity for span {span_id}: no system target or service.name attribute")]
    UnresolvableIdentity { span_id: String },
    #[error("layout failed: {0}")]
    Layout(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
