//! Chronograph Retrieval
//!
//! Turns a free-text question into a bounded, ranked subgraph plus
//! supporting passages:
//! - Seed search over accent-insensitive titles
//! - Bounded breadth-first expansion from the seeds
//! - Shortest multi-hop paths between seed pairs
//! - Context text assembly for a downstream answer generator

pub mod context;
pub mod index;
pub mod seeds;
pub mod traversal;

pub use context::{BundleNode, ContextBundle, RetrievalOutcome};
pub use index::RetrievalIndex;
pub use traversal::GraphPath;
