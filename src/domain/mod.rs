pub mod identity;
pub mod layout;
pub mod service_graph;
pub mod span;
pub mod tag_values;
