// Main library entry point for trace_graph.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod ports;

pub use error::GraphError;
