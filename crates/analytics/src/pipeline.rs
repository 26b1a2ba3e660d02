//! Batch annotation pipeline
//!
//! degree ranking -> PageRank -> community detection, each stage taking the
//! previous snapshot and returning a new one, followed by the small-world
//! report on the final snapshot. A snapshot without any usable edge is still
//! annotated; only its small-world report is omitted.

use crate::community::{CommunityAssignment, LabelPropagation};
use crate::ranking::{DegreeRanking, PageRankResult, PageRankScorer};
use crate::small_world::{SmallWorldAnalyzer, SmallWorldReport};
use chronograph_common::config::{CommunityConfig, PageRankConfig, SmallWorldConfig};
use chronograph_common::errors::{AppError, Result};
use chronograph_common::graph::GraphSnapshot;
use chronograph_common::metrics;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Wall time of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub seconds: f64,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Fully annotated snapshot
    pub graph: GraphSnapshot,
    pub degrees: DegreeRanking,
    pub pagerank: PageRankResult,
    pub communities: CommunityAssignment,

    /// Absent when no edge joins two known nodes
    pub report: Option<SmallWorldReport>,
    pub timings: Vec<StageTiming>,
}

/// The analytics stages wired in order
#[derive(Debug, Clone, Default)]
pub struct AnalyticsPipeline {
    pagerank: PageRankScorer,
    communities: LabelPropagation,
    small_world: SmallWorldAnalyzer,
}

impl AnalyticsPipeline {
    pub fn new(
        ranking: PageRankConfig,
        community: CommunityConfig,
        small_world: SmallWorldConfig,
    ) -> Self {
        Self {
            pagerank: PageRankScorer::new(ranking),
            communities: LabelPropagation::new(community),
            small_world: SmallWorldAnalyzer::new(small_world),
        }
    }

    /// Run every stage over `graph`; the input is left untouched
    pub fn run(&self, graph: &GraphSnapshot) -> Result<PipelineOutput> {
        if graph.is_empty() {
            return Err(AppError::empty_graph("analytics pipeline"));
        }
        let mut timings = Vec::with_capacity(4);

        let (degrees, graph) = timed(&mut timings, "degree", || {
            let degrees = DegreeRanking::compute(graph);
            let annotated = degrees.annotate(graph);
            Ok((degrees, annotated))
        })?;

        let (graph, pagerank) = timed(&mut timings, "pagerank", || self.pagerank.annotate(&graph))?;
        metrics::record_pagerank(pagerank.iterations);

        let (graph, communities) =
            timed(&mut timings, "community", || self.communities.annotate(&graph))?;

        let analyzed = timed(&mut timings, "small_world", || self.small_world.analyze(&graph));
        let report = match analyzed {
            Ok(report) => Some(report),
            Err(AppError::EmptyGraph { .. }) => {
                warn!(nodes = graph.node_count(), "No usable edges, small-world report skipped");
                None
            }
            Err(e) => return Err(e),
        };

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            pagerank_iterations = pagerank.iterations,
            communities = communities.community_count(),
            "Analytics pipeline finished"
        );

        Ok(PipelineOutput {
            graph,
            degrees,
            pagerank,
            communities,
            report,
            timings,
        })
    }
}

fn timed<T, F>(timings: &mut Vec<StageTiming>, stage: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let start = Instant::now();
    let out = f()?;
    let seconds = start.elapsed().as_secs_f64();
    metrics::record_stage(stage, seconds);
    info!(stage, seconds, "Stage finished");
    timings.push(StageTiming { stage, seconds });
    Ok(out)
}
