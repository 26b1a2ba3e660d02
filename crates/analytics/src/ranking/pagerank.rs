//! PageRank scoring over the directed view
//!
//! Power iteration from a uniform start. Dangling nodes spread their rank
//! over every node, damped like ordinary links, and every node receives the
//! `(1 - d) / N` teleport share.

use chronograph_common::config::PageRankConfig;
use chronograph_common::errors::{AppError, Result};
use chronograph_common::graph::{DirectedAdjacency, GraphSnapshot};
use serde::Serialize;
use tracing::{debug, info};

/// Scores and ranks indexed by node position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRankResult {
    /// Scores summing to 1
    pub scores: Vec<f64>,

    /// 1 = highest score; ties keep node order
    pub ranks: Vec<usize>,

    /// Iterations actually run
    pub iterations: usize,

    /// Whether the L1 change dropped below the tolerance
    pub converged: bool,

    /// L1 change of the last iteration
    pub delta: f64,
}

impl PageRankResult {
    /// Node positions ordered by rank
    pub fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.ranks.len()).collect();
        order.sort_by_key(|&i| self.ranks[i]);
        order
    }
}

/// PageRank scorer for snapshot nodes
#[derive(Debug, Clone, Default)]
pub struct PageRankScorer {
    config: PageRankConfig,
}

impl PageRankScorer {
    /// Create a new scorer
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PageRankConfig {
        &self.config
    }

    /// Compute PageRank over a directed adjacency
    pub fn compute(&self, adjacency: &DirectedAdjacency) -> Result<PageRankResult> {
        let n = adjacency.len();
        if n == 0 {
            return Err(AppError::empty_graph("pagerank"));
        }

        let n_f64 = n as f64;
        let damping = self.config.damping;
        let teleport = (1.0 - damping) / n_f64;

        // Precompute who links to whom
        let out_counts: Vec<usize> = (0..n).map(|i| adjacency.out_degree(i)).collect();
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); n];
        for source in 0..n {
            for &target in adjacency.targets(source) {
                incoming[target].push(source);
            }
        }

        let mut scores = vec![1.0 / n_f64; n];
        let mut iterations = 0;
        let mut converged = false;
        let mut delta = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            let dangling_sum: f64 = (0..n)
                .filter(|&i| out_counts[i] == 0)
                .map(|i| scores[i])
                .sum();
            let base = teleport + damping * dangling_sum / n_f64;

            let next: Vec<f64> = (0..n)
                .map(|node| {
                    let link_sum: f64 = incoming[node]
                        .iter()
                        .map(|&src| scores[src] / out_counts[src] as f64)
                        .sum();
                    base + damping * link_sum
                })
                .collect();

            delta = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
            scores = next;
            iterations = iteration;
            debug!(iteration, delta, "PageRank iteration");

            if delta < self.config.tolerance {
                converged = true;
                break;
            }
        }

        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            for score in &mut scores {
                *score /= total;
            }
        }

        let ranks = dense_order(&scores);
        info!(nodes = n, iterations, converged, delta, "PageRank computed");

        Ok(PageRankResult {
            scores,
            ranks,
            iterations,
            converged,
            delta,
        })
    }

    /// Compute PageRank over the union of all edge sources
    pub fn rank(&self, graph: &GraphSnapshot) -> Result<PageRankResult> {
        let (adjacency, _) = DirectedAdjacency::from_snapshot(graph);
        self.compute(&adjacency)
    }

    /// Copy of the snapshot with `pagerank` and `pagerank_rank` attached
    pub fn annotate(&self, graph: &GraphSnapshot) -> Result<(GraphSnapshot, PageRankResult)> {
        let result = self.rank(graph)?;
        let mut position = 0;
        let annotated = graph.map_nodes(|node| {
            node.metrics.pagerank = result.scores[position];
            node.metrics.pagerank_rank = result.ranks[position];
            position += 1;
        });
        Ok((annotated, result))
    }
}

/// Positions 1..N by descending score, ties by index
fn dense_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ranks = vec![0usize; scores.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank + 1;
    }
    ranks
}
