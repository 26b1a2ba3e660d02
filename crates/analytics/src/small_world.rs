//! Small-world diagnostics
//!
//! Connected components, giant-component share, sampled characteristic path
//! length with a distance histogram, and sampled local clustering. The
//! analyzer only reads the graph and emits a report.

use chronograph_common::config::SmallWorldConfig;
use chronograph_common::errors::{AppError, Result};
use chronograph_common::graph::{GraphSnapshot, UndirectedAdjacency};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::info;
use uuid::Uuid;

/// Histogram buckets: d=1, 2, 3, 4 and d>=5
pub const HISTOGRAM_BUCKETS: usize = 5;

/// One histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBucket {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Small-world report written next to the annotated nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallWorldReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,

    /// Fingerprint of the analyzed snapshot, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_fingerprint: Option<String>,

    /// Nodes with at least one edge
    pub node_count: usize,
    pub edge_count: usize,
    pub average_degree: f64,

    pub component_count: usize,
    pub giant_component_size: usize,
    pub giant_component_share: f64,

    /// BFS sources drawn from the giant component
    pub sample_size: usize,
    pub pair_count: usize,
    pub average_path_length: Option<f64>,
    pub max_distance: usize,
    pub distance_histogram: Vec<DistanceBucket>,

    /// ln(N_giant) / ln(average degree), absent when average degree <= 1
    pub reference_path_length: Option<f64>,

    /// Mean local clustering coefficient over the sample
    pub clustering_coefficient: f64,
}

/// Read-only small-world analyzer
#[derive(Debug, Clone, Default)]
pub struct SmallWorldAnalyzer {
    config: SmallWorldConfig,
}

impl SmallWorldAnalyzer {
    pub fn new(config: SmallWorldConfig) -> Self {
        Self { config }
    }

    /// Analyze the undirected view of a snapshot
    pub fn analyze(&self, graph: &GraphSnapshot) -> Result<SmallWorldReport> {
        let (adjacency, _) = UndirectedAdjacency::from_snapshot(graph);
        let mut report = self.analyze_adjacency(&adjacency)?;
        report.snapshot_fingerprint = Some(graph.fingerprint());
        Ok(report)
    }

    /// Analyze an undirected adjacency directly
    pub fn analyze_adjacency(&self, adjacency: &UndirectedAdjacency) -> Result<SmallWorldReport> {
        if adjacency.is_empty() {
            return Err(AppError::empty_graph("small-world analysis"));
        }

        let node_count = adjacency.node_count();
        let degree_sum: usize = adjacency.iter().map(|(_, n)| n.len()).sum();
        let average_degree = degree_sum as f64 / node_count as f64;

        let components = connected_components(adjacency);
        let giant = components.first().cloned().unwrap_or_default();
        let giant_share = giant.len() as f64 / node_count as f64;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let take = self.config.sample_size.min(giant.len());
        let sample: Vec<&str> = giant.choose_multiple(&mut rng, take).copied().collect();

        let mut total_distance = 0usize;
        let mut pair_count = 0usize;
        let mut max_distance = 0usize;
        let mut histogram = [0usize; HISTOGRAM_BUCKETS];

        for &source in &sample {
            for (&node, &distance) in &bfs_distances(adjacency, source) {
                if node == source {
                    continue;
                }
                total_distance += distance;
                pair_count += 1;
                max_distance = max_distance.max(distance);
                histogram[distance.min(HISTOGRAM_BUCKETS) - 1] += 1;
            }
        }

        let distance_histogram = histogram
            .iter()
            .enumerate()
            .map(|(i, &count)| DistanceBucket {
                label: if i + 1 < HISTOGRAM_BUCKETS {
                    format!("d={}", i + 1)
                } else {
                    format!("d>={}", HISTOGRAM_BUCKETS)
                },
                count,
                percentage: if pair_count > 0 {
                    count as f64 * 100.0 / pair_count as f64
                } else {
                    0.0
                },
            })
            .collect();

        let average_path_length =
            (pair_count > 0).then(|| total_distance as f64 / pair_count as f64);
        let reference_path_length = (average_degree > 1.0 && giant.len() > 1)
            .then(|| (giant.len() as f64).ln() / average_degree.ln());

        let clustering_coefficient = if sample.is_empty() {
            0.0
        } else {
            sample
                .iter()
                .map(|node| local_clustering(adjacency, node))
                .sum::<f64>()
                / sample.len() as f64
        };

        info!(
            nodes = node_count,
            components = components.len(),
            giant = giant.len(),
            sample = sample.len(),
            average_path_length,
            max_distance,
            "Small-world analysis finished"
        );

        Ok(SmallWorldReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            snapshot_fingerprint: None,
            node_count,
            edge_count: degree_sum / 2,
            average_degree,
            component_count: components.len(),
            giant_component_size: giant.len(),
            giant_component_share: giant_share,
            sample_size: sample.len(),
            pair_count,
            average_path_length,
            max_distance,
            distance_histogram,
            reference_path_length,
            clustering_coefficient,
        })
    }

    /// Shortest path between two titles on the undirected view
    pub fn shortest_path(
        &self,
        adjacency: &UndirectedAdjacency,
        source: &str,
        target: &str,
    ) -> Result<Option<Vec<String>>> {
        for title in [source, target] {
            if !adjacency.contains(title) {
                return Err(AppError::UnknownNode {
                    title: title.to_string(),
                });
            }
        }
        Ok(adjacency.shortest_path(source, target, usize::MAX))
    }
}

/// Components by BFS, largest first; ties keep discovery order
pub fn connected_components(adjacency: &UndirectedAdjacency) -> Vec<Vec<&str>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();

    for start in adjacency.nodes() {
        if !seen.insert(start.as_str()) {
            continue;
        }
        let mut component = vec![start.as_str()];
        let mut queue = VecDeque::from([start.as_str()]);
        while let Some(node) = queue.pop_front() {
            for next in adjacency.neighbors(node).into_iter().flatten() {
                if seen.insert(next.as_str()) {
                    component.push(next.as_str());
                    queue.push_back(next.as_str());
                }
            }
        }
        components.push(component);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()));
    components
}

/// Hop distance from `source` to every reachable node (source included at 0)
pub fn bfs_distances<'a>(
    adjacency: &'a UndirectedAdjacency,
    source: &'a str,
) -> HashMap<&'a str, usize> {
    let mut distances = HashMap::from([(source, 0usize)]);
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let depth = distances[node];
        for next in adjacency.neighbors(node).into_iter().flatten() {
            if !distances.contains_key(next.as_str()) {
                distances.insert(next.as_str(), depth + 1);
                queue.push_back(next.as_str());
            }
        }
    }
    distances
}

/// Share of neighbor pairs that are themselves linked
pub fn local_clustering(adjacency: &UndirectedAdjacency, node: &str) -> f64 {
    let Some(neighbors) = adjacency.neighbors(node) else {
        return 0.0;
    };
    let degree = neighbors.len();
    if degree < 2 {
        return 0.0;
    }

    let neighbors: Vec<&String> = neighbors.iter().collect();
    let mut links = 0usize;
    for (i, a) in neighbors.iter().enumerate() {
        let Some(around_a) = adjacency.neighbors(a) else {
            continue;
        };
        links += neighbors[i + 1..].iter().filter(|b| around_a.contains(**b)).count();
    }

    links as f64 / (degree * (degree - 1) / 2) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> UndirectedAdjacency {
        UndirectedAdjacency::from_pairs((1..n).map(|i| (format!("n{}", i - 1), format!("n{i}"))))
    }

    #[test]
    fn test_components_sorted_by_size() {
        let adjacency = UndirectedAdjacency::from_pairs([("a", "b"), ("b", "c"), ("x", "y")]);
        let components = connected_components(&adjacency);

        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 3);
        assert_eq!(components[1], vec!["x", "y"]);
    }

    #[test]
    fn test_path_graph_report() {
        let report = SmallWorldAnalyzer::default().analyze_adjacency(&path(4)).unwrap();

        assert_eq!(report.node_count, 4);
        assert_eq!(report.edge_count, 3);
        assert_eq!(report.component_count, 1);
        assert_eq!(report.giant_component_share, 1.0);
        assert_eq!(report.sample_size, 4);
        // ordered pairs: 6 at d=1, 4 at d=2, 2 at d=3
        assert_eq!(report.pair_count, 12);
        assert_eq!(report.max_distance, 3);
        assert!((report.average_path_length.unwrap() - 20.0 / 12.0).abs() < 1e-12);
        assert_eq!(report.distance_histogram[0].count, 6);
        assert_eq!(report.distance_histogram[2].count, 2);
        assert_eq!(report.distance_histogram[4].label, "d>=5");
        assert!((report.distance_histogram[0].percentage - 50.0).abs() < 1e-9);
        assert_eq!(report.clustering_coefficient, 0.0);
        // average degree 1.5 > 1
        assert!(report.reference_path_length.is_some());
    }

    #[test]
    fn test_long_distances_land_in_last_bucket() {
        let report = SmallWorldAnalyzer::default().analyze_adjacency(&path(7)).unwrap();
        assert_eq!(report.max_distance, 6);
        // ordered pairs at distance 5 and 6: 2 * (2 + 1)
        assert_eq!(report.distance_histogram[4].count, 6);
    }

    #[test]
    fn test_sample_capped_and_reproducible() {
        let analyzer = SmallWorldAnalyzer::new(SmallWorldConfig {
            sample_size: 3,
            seed: 11,
        });
        let first = analyzer.analyze_adjacency(&path(10)).unwrap();
        let second = analyzer.analyze_adjacency(&path(10)).unwrap();

        assert_eq!(first.sample_size, 3);
        assert_eq!(first.pair_count, 27);
        assert_eq!(first.average_path_length, second.average_path_length);
    }

    #[test]
    fn test_reference_absent_for_single_edge() {
        let adjacency = UndirectedAdjacency::from_pairs([("a", "b")]);
        let report = SmallWorldAnalyzer::default().analyze_adjacency(&adjacency).unwrap();
        assert_eq!(report.average_degree, 1.0);
        assert_eq!(report.reference_path_length, None);
    }

    #[test]
    fn test_triangle_clustering() {
        let adjacency =
            UndirectedAdjacency::from_pairs([("a", "b"), ("b", "c"), ("a", "c"), ("c", "d")]);
        assert_eq!(local_clustering(&adjacency, "a"), 1.0);
        assert!((local_clustering(&adjacency, "c") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(local_clustering(&adjacency, "d"), 0.0);
    }

    #[test]
    fn test_shortest_path_query() {
        let analyzer = SmallWorldAnalyzer::default();
        let adjacency = UndirectedAdjacency::from_pairs([("a", "b"), ("b", "c"), ("x", "y")]);

        assert_eq!(
            analyzer.shortest_path(&adjacency, "a", "c").unwrap(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(analyzer.shortest_path(&adjacency, "a", "x").unwrap(), None);
        assert!(matches!(
            analyzer.shortest_path(&adjacency, "a", "zz"),
            Err(AppError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_empty_adjacency_is_error() {
        let err = SmallWorldAnalyzer::default()
            .analyze_adjacency(&UndirectedAdjacency::default())
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyGraph { .. }));
    }

    #[test]
    fn test_report_serializes() {
        let report = SmallWorldAnalyzer::default().analyze_adjacency(&path(3)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("snapshot_fingerprint").is_none());
        assert_eq!(json["giant_component_size"], 3);
    }
}
