//! Community detection by asynchronous label propagation
//!
//! Every node with an edge starts with its own title as label. Each epoch
//! visits the nodes in shuffled order and moves each one to the most common
//! label among its neighbors (smallest label on ties). Communities are
//! numbered 1..K by descending size; nodes without edges get id 0.

use chronograph_common::config::CommunityConfig;
use chronograph_common::errors::{AppError, Result};
use chronograph_common::graph::{GraphSnapshot, UndirectedAdjacency, ISOLATED_COMMUNITY};
use chronograph_common::metrics;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// One propagated community
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Community {
    /// 1 = largest
    pub id: u32,
    pub label: String,
    pub members: Vec<String>,
}

impl Community {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Result of a propagation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommunityAssignment {
    /// Epochs actually run
    pub epochs: usize,

    /// Whether the last epoch changed no label
    pub converged: bool,

    /// Final label per node with at least one edge
    pub labels: BTreeMap<String, String>,

    /// Communities ordered by id
    pub communities: Vec<Community>,

    #[serde(skip)]
    membership: HashMap<String, usize>,
}

impl CommunityAssignment {
    fn from_labels(labels: BTreeMap<String, String>, epochs: usize, converged: bool) -> Self {
        let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (title, label) in &labels {
            groups.entry(label.as_str()).or_default().push(title.clone());
        }

        let mut groups: Vec<(&str, Vec<String>)> = groups.into_iter().collect();
        // stable: equal sizes stay in label order
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let communities: Vec<Community> = groups
            .into_iter()
            .enumerate()
            .map(|(i, (label, members))| Community {
                id: i as u32 + 1,
                label: label.to_string(),
                members,
            })
            .collect();

        let membership = communities
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.members.iter().map(move |m| (m.clone(), i)))
            .collect();

        Self {
            epochs,
            converged,
            labels,
            communities,
            membership,
        }
    }

    /// Number of propagated communities (isolated nodes excluded)
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    /// Community of a node, `None` for nodes without edges
    pub fn community_of(&self, title: &str) -> Option<&Community> {
        self.membership.get(title).map(|&i| &self.communities[i])
    }

    /// (id, size, label) for any snapshot node
    pub fn assignment(&self, title: &str) -> (u32, usize, String) {
        match self.community_of(title) {
            Some(c) => (c.id, c.size(), c.label.clone()),
            None => (ISOLATED_COMMUNITY, 1, title.to_string()),
        }
    }
}

/// Label propagation community detector
#[derive(Debug, Clone, Default)]
pub struct LabelPropagation {
    config: CommunityConfig,
}

impl LabelPropagation {
    pub fn new(config: CommunityConfig) -> Self {
        Self { config }
    }

    /// Detect communities with the configured seed
    pub fn detect(&self, adjacency: &UndirectedAdjacency) -> Result<CommunityAssignment> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.detect_with_rng(adjacency, &mut rng)
    }

    /// Detect communities with a caller-supplied generator
    pub fn detect_with_rng<R: Rng + ?Sized>(
        &self,
        adjacency: &UndirectedAdjacency,
        rng: &mut R,
    ) -> Result<CommunityAssignment> {
        self.resume_with_rng(adjacency, &BTreeMap::new(), rng)
    }

    /// Continue propagation from an existing labeling.
    ///
    /// Nodes missing from `initial` start with their own title.
    pub fn resume_with_rng<R: Rng + ?Sized>(
        &self,
        adjacency: &UndirectedAdjacency,
        initial: &BTreeMap<String, String>,
        rng: &mut R,
    ) -> Result<CommunityAssignment> {
        if adjacency.is_empty() {
            return Err(AppError::empty_graph("community detection"));
        }

        let mut labels: HashMap<&str, String> = adjacency
            .nodes()
            .map(|title| {
                let label = initial.get(title).unwrap_or(title).clone();
                (title.as_str(), label)
            })
            .collect();
        let mut order: Vec<&str> = adjacency.nodes().map(String::as_str).collect();

        let mut epochs = 0;
        let mut converged = false;

        for epoch in 1..=self.config.max_epochs {
            order.shuffle(rng);
            let mut changes = 0;

            for &node in &order {
                let Some(neighbors) = adjacency.neighbors(node) else {
                    continue;
                };
                let candidates = neighbors.iter().map(|n| labels[n.as_str()].as_str());
                let Some(best) = most_common_label(candidates) else {
                    continue;
                };
                if labels[node] != best {
                    let best = best.to_string();
                    labels.insert(node, best);
                    changes += 1;
                }
            }

            epochs = epoch;
            debug!(epoch, changes, "Label propagation epoch");
            if changes == 0 {
                converged = true;
                break;
            }
        }

        let labels: BTreeMap<String, String> = labels
            .into_iter()
            .map(|(title, label)| (title.to_string(), label))
            .collect();
        let assignment = CommunityAssignment::from_labels(labels, epochs, converged);

        metrics::record_communities(epochs, assignment.community_count());
        info!(
            nodes = adjacency.node_count(),
            epochs,
            converged,
            communities = assignment.community_count(),
            "Label propagation finished"
        );
        Ok(assignment)
    }

    /// Copy of the snapshot with community fields attached
    pub fn annotate(&self, graph: &GraphSnapshot) -> Result<(GraphSnapshot, CommunityAssignment)> {
        if graph.is_empty() {
            return Err(AppError::empty_graph("community detection"));
        }
        let (adjacency, _) = UndirectedAdjacency::from_snapshot(graph);
        let assignment = if adjacency.is_empty() {
            CommunityAssignment::from_labels(BTreeMap::new(), 0, true)
        } else {
            self.detect(&adjacency)?
        };

        let annotated = graph.map_nodes(|node| {
            let (id, size, label) = assignment.assignment(&node.title);
            node.metrics.community_id = id;
            node.metrics.community_size = size;
            node.metrics.community_label = Some(label);
        });
        Ok((annotated, assignment))
    }
}

/// Most frequent label; the smallest one wins a tie
fn most_common_label<'a, I>(labels: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronograph_common::graph::{EdgeRecord, NodeRecord};
    use rand::rngs::mock::StepRng;

    fn two_triangles() -> UndirectedAdjacency {
        UndirectedAdjacency::from_pairs([
            ("a1", "a2"),
            ("a2", "a3"),
            ("a1", "a3"),
            ("b1", "b2"),
            ("b2", "b3"),
            ("b1", "b3"),
            ("a3", "b3"),
        ])
    }

    #[test]
    fn test_most_common_label_tie_breaks_lexicographically() {
        assert_eq!(most_common_label(["b", "a", "c"]), Some("a"));
        assert_eq!(most_common_label(["b", "c", "c"]), Some("c"));
        assert_eq!(most_common_label(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_two_triangles_form_two_communities() {
        // constant generator: each shuffle rotates the visiting order by one
        let mut rng = StepRng::new(0, 0);
        let assignment = LabelPropagation::default()
            .detect_with_rng(&two_triangles(), &mut rng)
            .unwrap();

        assert!(assignment.converged);
        assert_eq!(assignment.community_count(), 2);

        let covered: usize = assignment.communities.iter().map(Community::size).sum();
        assert_eq!(covered, 6);
        assert_eq!(
            assignment.community_of("a1").unwrap().id,
            assignment.community_of("a3").unwrap().id
        );
        assert_ne!(
            assignment.community_of("a1").unwrap().id,
            assignment.community_of("b1").unwrap().id
        );
    }

    #[test]
    fn test_default_seed_separates_bridged_triangles() {
        let assignment = LabelPropagation::default().detect(&two_triangles()).unwrap();

        assert!(assignment.converged);
        assert_eq!(assignment.community_count(), 2);
        let covered: usize = assignment.communities.iter().map(Community::size).sum();
        assert_eq!(covered, 6);
        assert_eq!(assignment.communities[0].id, 1);
        assert_eq!(assignment.communities[1].id, 2);

        let a = assignment.community_of("a2").unwrap().id;
        let b = assignment.community_of("b2").unwrap().id;
        assert_ne!(a, b);
        for title in ["a1", "a3"] {
            assert_eq!(assignment.community_of(title).unwrap().id, a);
        }
        for title in ["b1", "b3"] {
            assert_eq!(assignment.community_of(title).unwrap().id, b);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let detector = LabelPropagation::default();
        let first = detector.detect(&two_triangles()).unwrap();
        let second = detector.detect(&two_triangles()).unwrap();
        assert_eq!(first.labels, second.labels);
    }

    #[test]
    fn test_resume_from_converged_labels_is_idempotent() {
        let detector = LabelPropagation::default();
        let adjacency = two_triangles();
        let converged = detector.detect(&adjacency).unwrap();
        assert!(converged.converged);

        let mut rng = StdRng::seed_from_u64(99);
        let resumed = detector
            .resume_with_rng(&adjacency, &converged.labels, &mut rng)
            .unwrap();

        assert_eq!(resumed.epochs, 1);
        assert!(resumed.converged);
        assert_eq!(resumed.labels, converged.labels);
    }

    #[test]
    fn test_epoch_cap_reported() {
        let detector = LabelPropagation::new(CommunityConfig {
            max_epochs: 1,
            ..Default::default()
        });
        let assignment = detector.detect(&two_triangles()).unwrap();
        assert_eq!(assignment.epochs, 1);
        assert!(!assignment.converged);
    }

    #[test]
    fn test_empty_adjacency_is_error() {
        let err = LabelPropagation::default()
            .detect(&UndirectedAdjacency::default())
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyGraph { .. }));
    }

    #[test]
    fn test_annotate_marks_isolated_nodes() {
        let graph = GraphSnapshot::builder()
            .nodes(["A", "B", "C", "Lonely"].map(|t| NodeRecord::new(t, "person")))
            .edge_source(
                "base",
                [EdgeRecord::new("A", "B", "kinship"), EdgeRecord::new("B", "C", "kinship")],
            )
            .build();

        let (annotated, assignment) = LabelPropagation::default().annotate(&graph).unwrap();
        let lonely = annotated.node("Lonely").unwrap();

        assert_eq!(lonely.metrics.community_id, ISOLATED_COMMUNITY);
        assert_eq!(lonely.metrics.community_size, 1);
        assert_eq!(lonely.metrics.community_label.as_deref(), Some("Lonely"));
        assert_eq!(assignment.community_count(), 1);
        assert_eq!(annotated.node("A").unwrap().metrics.community_id, 1);
        assert_eq!(annotated.node("C").unwrap().metrics.community_size, 3);
    }
}
