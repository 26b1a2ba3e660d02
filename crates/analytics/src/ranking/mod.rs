//! Node ranking
//!
//! Degree ranking per edge source and PageRank over the union of sources.

pub mod degree;
pub mod pagerank;

pub use degree::DegreeRanking;
pub use pagerank::{PageRankResult, PageRankScorer};

use chronograph_common::config::PageRankConfig;
use chronograph_common::errors::{AppError, Result};
use chronograph_common::graph::GraphSnapshot;

/// Runs both rankings and attaches their fields to a snapshot copy
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    scorer: PageRankScorer,
}

/// Everything one ranking pass produced
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub graph: GraphSnapshot,
    pub degrees: DegreeRanking,
    pub pagerank: PageRankResult,
}

impl RankingEngine {
    pub fn new(config: PageRankConfig) -> Self {
        Self {
            scorer: PageRankScorer::new(config),
        }
    }

    /// Degree tables only
    pub fn degrees(&self, graph: &GraphSnapshot) -> DegreeRanking {
        DegreeRanking::compute(graph)
    }

    /// PageRank only
    pub fn pagerank(&self, graph: &GraphSnapshot) -> Result<PageRankResult> {
        self.scorer.rank(graph)
    }

    /// Degree ranking then PageRank, each producing a new snapshot
    pub fn rank(&self, graph: &GraphSnapshot) -> Result<RankingOutcome> {
        if graph.is_empty() {
            return Err(AppError::empty_graph("ranking"));
        }
        let degrees = DegreeRanking::compute(graph);
        let with_degrees = degrees.annotate(graph);
        let (graph, pagerank) = self.scorer.annotate(&with_degrees)?;

        Ok(RankingOutcome {
            graph,
            degrees,
            pagerank,
        })
    }
}
