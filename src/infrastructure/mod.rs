// Infrastructure implementations of the ports.

pub mod concurrency;
pub mod json_exporter;
pub mod span_loader;
pub mod tree_layout;

pub use json_exporter::JsonExporter;
pub use span_loader::JsonSpanLoader;
pub use tree_layout::TreeLayoutEngine;
