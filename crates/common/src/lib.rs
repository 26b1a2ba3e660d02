//! Chronograph Common Library
//!
//! Shared code for the analytics and retrieval crates including:
//! - Property graph model and immutable snapshots
//! - Dataset loading and writing
//! - Error types and handling
//! - Configuration management
//! - Text normalization for keyword matching
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod graph;
pub mod io;
pub mod metrics;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use graph::{GraphSnapshot, Node, NodeMetrics};
pub use io::LoadReport;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
