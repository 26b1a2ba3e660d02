//! Chronograph Analytics
//!
//! Graph-wide computations over an immutable snapshot:
//! - Degree ranking per edge source and combined
//! - PageRank by power iteration
//! - Community detection by label propagation
//! - Small-world diagnostics (components, path lengths, clustering)
//!
//! Every stage returns a new annotated snapshot instead of mutating its input.

pub mod community;
pub mod pipeline;
pub mod ranking;
pub mod small_world;

pub use community::{Community, CommunityAssignment, LabelPropagation};
pub use pipeline::{AnalyticsPipeline, PipelineOutput, StageTiming};
pub use ranking::{DegreeRanking, PageRankResult, PageRankScorer, RankingEngine, RankingOutcome};
pub use small_world::{SmallWorldAnalyzer, SmallWorldReport};

/// Community detection entry point under its component name
pub type CommunityDetector = LabelPropagation;
