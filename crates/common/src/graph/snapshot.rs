//! Graph snapshot representation
//!
//! An immutable set of nodes (keyed by title, kept in load order) plus one
//! edge set per named source and their deduplicated union.

use super::{EdgeRecord, Node, NodeRecord};
use crate::metrics;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use validator::Validate;

/// Edges from one named source, deduplicated on (source, target, type)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSet {
    pub name: String,
    pub edges: Vec<EdgeRecord>,
}

/// Immutable in-memory graph
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    /// Nodes in insertion order
    nodes: Vec<Node>,

    /// Title -> position in `nodes`
    index: HashMap<String, usize>,

    /// Edge sources in the order they were added
    sources: Vec<EdgeSet>,

    /// Union of all sources, first-seen edge wins
    union: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Start assembling a snapshot
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by title
    pub fn node(&self, title: &str) -> Option<&Node> {
        self.index.get(title).map(|&i| &self.nodes[i])
    }

    /// Position of a node in insertion order
    pub fn position(&self, title: &str) -> Option<usize> {
        self.index.get(title).copied()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    /// Named edge sources
    pub fn sources(&self) -> &[EdgeSet] {
        &self.sources
    }

    /// Union of all edge sources
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.union
    }

    /// Get edge count of the union
    pub fn edge_count(&self) -> usize {
        self.union.len()
    }

    /// Copy of this snapshot with every node passed through `annotate`.
    ///
    /// Analytics stages use this to produce a new annotated snapshot instead
    /// of mutating the one they were given.
    pub fn map_nodes<F>(&self, mut annotate: F) -> GraphSnapshot
    where
        F: FnMut(&mut Node),
    {
        let mut next = self.clone();
        for node in &mut next.nodes {
            annotate(node);
        }
        next
    }

    /// Hex SHA-256 over sorted titles and sorted union edges
    pub fn fingerprint(&self) -> String {
        let mut titles: Vec<&str> = self.nodes.iter().map(|n| n.title.as_str()).collect();
        titles.sort_unstable();

        let mut edges: Vec<(&str, &str, &str)> = self
            .union
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.kind.as_str()))
            .collect();
        edges.sort_unstable();

        let mut hasher = Sha256::new();
        for title in titles {
            hasher.update(title.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([0xffu8]);
        for (source, target, kind) in edges {
            hasher.update(source.as_bytes());
            hasher.update([0u8]);
            hasher.update(target.as_bytes());
            hasher.update([0u8]);
            hasher.update(kind.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

/// Accumulates nodes and edge sources into a [`GraphSnapshot`]
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    sources: Vec<EdgeSet>,
    duplicate_nodes: usize,
    duplicate_edges: usize,
    invalid_edges: usize,
}

impl SnapshotBuilder {
    /// Add a node; returns false (and keeps the first) on a duplicate title
    pub fn add_node(&mut self, record: NodeRecord) -> bool {
        if self.index.contains_key(&record.title) {
            debug!(title = %record.title, "Duplicate node title skipped");
            self.duplicate_nodes += 1;
            metrics::record_skip("duplicate_node");
            return false;
        }
        self.index.insert(record.title.clone(), self.nodes.len());
        self.nodes.push(Node::from_record(record));
        true
    }

    /// Add many nodes
    pub fn nodes<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = NodeRecord>,
    {
        for record in records {
            self.add_node(record);
        }
        self
    }

    /// Add a named edge source; duplicates of (source, target, type) keep the first evidence
    pub fn add_edge_source<I>(&mut self, name: &str, edges: I)
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut kept = Vec::new();

        for edge in edges {
            if edge.validate().is_err() {
                debug!(source = %edge.source, target = %edge.target, "Invalid edge skipped");
                self.invalid_edges += 1;
                metrics::record_skip("invalid_edge");
                continue;
            }
            let key = (edge.source.clone(), edge.target.clone(), edge.kind.clone());
            if !seen.insert(key) {
                self.duplicate_edges += 1;
                continue;
            }
            kept.push(edge);
        }

        match self.sources.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                let mut present: HashSet<(String, String, String)> = existing
                    .edges
                    .iter()
                    .map(|e| (e.source.clone(), e.target.clone(), e.kind.clone()))
                    .collect();
                for edge in kept {
                    let key = (edge.source.clone(), edge.target.clone(), edge.kind.clone());
                    if present.insert(key) {
                        existing.edges.push(edge);
                    } else {
                        self.duplicate_edges += 1;
                    }
                }
            }
            None => self.sources.push(EdgeSet {
                name: name.to_string(),
                edges: kept,
            }),
        }
    }

    /// Add a named edge source (chaining form)
    pub fn edge_source<I>(mut self, name: &str, edges: I) -> Self
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        self.add_edge_source(name, edges);
        self
    }

    /// Finish the snapshot
    pub fn build(self) -> GraphSnapshot {
        let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
        let mut union = Vec::new();
        for source in &self.sources {
            for edge in &source.edges {
                if seen.insert((edge.source.as_str(), edge.target.as_str(), edge.kind.as_str())) {
                    union.push(edge.clone());
                }
            }
        }

        info!(
            nodes = self.nodes.len(),
            sources = self.sources.len(),
            edges = union.len(),
            duplicate_nodes = self.duplicate_nodes,
            duplicate_edges = self.duplicate_edges,
            invalid_edges = self.invalid_edges,
            "Graph snapshot assembled"
        );

        GraphSnapshot {
            nodes: self.nodes,
            index: self.index,
            sources: self.sources,
            union,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphSnapshot {
        GraphSnapshot::builder()
            .nodes([
                NodeRecord::new("Gia Long", "ruler"),
                NodeRecord::new("Minh Mạng", "ruler"),
                NodeRecord::new("Huế", "place"),
            ])
            .edge_source(
                "base",
                [
                    EdgeRecord::new("Gia Long", "Minh Mạng", "succession").with_evidence("first"),
                    EdgeRecord::new("Gia Long", "Minh Mạng", "succession").with_evidence("second"),
                    EdgeRecord::new("Gia Long", "Minh Mạng", "kinship"),
                ],
            )
            .edge_source(
                "text",
                [
                    EdgeRecord::new("Gia Long", "Minh Mạng", "succession").with_evidence("text"),
                    EdgeRecord::new("Minh Mạng", "Huế", "mention"),
                ],
            )
            .build()
    }

    #[test]
    fn test_snapshot_construction() {
        let graph = sample();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.position("Huế"), Some(2));
        assert_eq!(graph.sources().len(), 2);
        assert_eq!(graph.sources()[0].edges.len(), 2);
        assert_eq!(graph.sources()[1].edges.len(), 2);
    }

    #[test]
    fn test_duplicate_triples_keep_first_evidence() {
        let graph = sample();

        let succession: Vec<_> = graph
            .edges()
            .iter()
            .filter(|e| e.kind == "succession")
            .collect();
        assert_eq!(succession.len(), 1);
        assert_eq!(succession[0].evidence.as_deref(), Some("first"));
        // parallel edge with a different type survives
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_duplicate_node_keeps_first() {
        let mut builder = GraphSnapshot::builder();
        assert!(builder.add_node(NodeRecord::new("Huế", "place")));
        assert!(!builder.add_node(NodeRecord::new("Huế", "city")));
        let graph = builder.build();
        assert_eq!(graph.node("Huế").unwrap().kind, "place");
    }

    #[test]
    fn test_self_loop_skipped() {
        let graph = GraphSnapshot::builder()
            .nodes([NodeRecord::new("A", "x")])
            .edge_source("base", [EdgeRecord::new("A", "A", "kinship")])
            .build();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_map_nodes_leaves_original_untouched() {
        let graph = sample();
        let annotated = graph.map_nodes(|n| n.metrics.pagerank = 0.5);

        assert_eq!(graph.node("Huế").unwrap().metrics.pagerank, 0.0);
        assert_eq!(annotated.node("Huế").unwrap().metrics.pagerank, 0.5);
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let a = GraphSnapshot::builder()
            .nodes([NodeRecord::new("A", "x"), NodeRecord::new("B", "x")])
            .edge_source("base", [EdgeRecord::new("A", "B", "t")])
            .build();
        let b = GraphSnapshot::builder()
            .nodes([NodeRecord::new("B", "x"), NodeRecord::new("A", "x")])
            .edge_source("text", [EdgeRecord::new("A", "B", "t")])
            .build();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
