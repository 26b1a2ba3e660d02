//! Degree ranking
//!
//! Counts out/in/total degree per edge source, one per edge record, and
//! sums them into a combined total. Nodes without edges stay unranked.

use chronograph_common::graph::{GraphSnapshot, SourceDegree};
use std::collections::BTreeMap;
use tracing::debug;

/// Degree tables indexed by node position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegreeRanking {
    /// Per edge source name
    pub sources: BTreeMap<String, Vec<SourceDegree>>,

    /// Sum of total degrees across sources
    pub combined_total: Vec<usize>,

    /// Rank of the combined total (0 = unranked)
    pub combined_rank: Vec<usize>,
}

impl DegreeRanking {
    /// Compute degree tables for every edge source of the snapshot
    pub fn compute(graph: &GraphSnapshot) -> Self {
        let n = graph.node_count();
        let mut sources = BTreeMap::new();
        let mut combined_total = vec![0usize; n];

        for source in graph.sources() {
            let mut table = vec![SourceDegree::default(); n];
            let mut dropped = 0usize;

            // every edge record counts, including parallel edges of other types
            for edge in &source.edges {
                if edge.source == edge.target {
                    dropped += 1;
                    continue;
                }
                match (graph.position(&edge.source), graph.position(&edge.target)) {
                    (Some(s), Some(t)) => {
                        table[s].out_degree += 1;
                        table[t].in_degree += 1;
                    }
                    _ => dropped += 1,
                }
            }
            if dropped > 0 {
                debug!(source = %source.name, dropped, "Edges outside the snapshot not counted");
            }

            let totals: Vec<usize> = table
                .iter_mut()
                .map(|row| {
                    row.total_degree = row.out_degree + row.in_degree;
                    row.total_degree
                })
                .collect();
            for (row, rank) in table.iter_mut().zip(rank_positions(&totals)) {
                row.rank = rank;
            }
            for (sum, total) in combined_total.iter_mut().zip(&totals) {
                *sum += total;
            }

            sources.insert(source.name.clone(), table);
        }

        let combined_rank = rank_positions(&combined_total);
        Self {
            sources,
            combined_total,
            combined_rank,
        }
    }

    /// Copy of the snapshot with degree fields attached
    pub fn annotate(&self, graph: &GraphSnapshot) -> GraphSnapshot {
        let mut position = 0;
        graph.map_nodes(|node| {
            node.metrics.degrees = self
                .sources
                .iter()
                .map(|(name, table)| (name.clone(), table[position]))
                .collect();
            node.metrics.combined_total_degree = self.combined_total[position];
            node.metrics.combined_rank = self.combined_rank[position];
            position += 1;
        })
    }
}

/// Positions 1..K by descending value; ties keep input order, zeros get 0
pub fn rank_positions(values: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).filter(|&i| values[i] > 0).collect();
    order.sort_by(|&a, &b| values[b].cmp(&values[a]));

    let mut ranks = vec![0usize; values.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank + 1;
    }
    ranks
}
