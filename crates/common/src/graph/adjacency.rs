//! Directed and undirected adjacency views over a snapshot
//!
//! Both views keep only edges whose endpoints are known titles and drop
//! self-loops. Parallel edges collapse into one adjacency entry.

use super::{EdgeRecord, GraphSnapshot};
use crate::metrics;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};

/// Outcome of filtering edges into an adjacency view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacencyStats {
    /// Edges that made it into the view (before parallel-edge merging)
    pub kept: usize,

    /// Edges referencing a title missing from the snapshot
    pub unknown_node: usize,

    /// Edges whose endpoints coincide
    pub self_loop: usize,
}

impl AdjacencyStats {
    fn admit(&mut self, graph: &GraphSnapshot, edge: &EdgeRecord) -> bool {
        if edge.source == edge.target {
            self.self_loop += 1;
            return false;
        }
        if !graph.contains(&edge.source) || !graph.contains(&edge.target) {
            debug!(source = %edge.source, target = %edge.target, "Edge references unknown node");
            self.unknown_node += 1;
            return false;
        }
        self.kept += 1;
        true
    }

    fn report(&self, view: &str) {
        metrics::record_dropped_edges("unknown_node", self.unknown_node);
        metrics::record_dropped_edges("self_loop", self.self_loop);
        info!(
            view,
            kept = self.kept,
            unknown_node = self.unknown_node,
            self_loop = self.self_loop,
            "Adjacency built"
        );
    }
}

/// Index-based directed adjacency covering every node of the snapshot
#[derive(Debug, Clone, Default)]
pub struct DirectedAdjacency {
    /// Out-neighbors by node position, sorted and unique
    targets: Vec<Vec<usize>>,
}

impl DirectedAdjacency {
    /// Build from a list of edges (typically one source or the union)
    pub fn from_edges<'a, I>(graph: &GraphSnapshot, edges: I) -> (Self, AdjacencyStats)
    where
        I: IntoIterator<Item = &'a EdgeRecord>,
    {
        let mut stats = AdjacencyStats::default();
        let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); graph.node_count()];

        for edge in edges {
            if !stats.admit(graph, edge) {
                continue;
            }
            if let (Some(s), Some(t)) =
                (graph.position(&edge.source), graph.position(&edge.target))
            {
                sets[s].insert(t);
            }
        }

        stats.report("directed");
        let targets = sets.into_iter().map(|s| s.into_iter().collect()).collect();
        (Self { targets }, stats)
    }

    /// Build over the union of all edge sources
    pub fn from_snapshot(graph: &GraphSnapshot) -> (Self, AdjacencyStats) {
        Self::from_edges(graph, graph.edges())
    }

    /// Node count (including nodes without edges)
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Out-neighbors of the node at `position`
    pub fn targets(&self, position: usize) -> &[usize] {
        self.targets.get(position).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn out_degree(&self, position: usize) -> usize {
        self.targets(position).len()
    }

    /// Distinct directed edges
    pub fn edge_count(&self) -> usize {
        self.targets.iter().map(Vec::len).sum()
    }
}

/// Title-keyed undirected adjacency; only nodes with at least one edge appear
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndirectedAdjacency {
    neighbors: BTreeMap<String, BTreeSet<String>>,
}

impl UndirectedAdjacency {
    /// Build from any edges, restricted to titles known by the snapshot
    pub fn from_edges<'a, I>(graph: &GraphSnapshot, edges: I) -> (Self, AdjacencyStats)
    where
        I: IntoIterator<Item = &'a EdgeRecord>,
    {
        let mut stats = AdjacencyStats::default();
        let mut neighbors: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for edge in edges {
            if !stats.admit(graph, edge) {
                continue;
            }
            neighbors
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone());
            neighbors
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
        }

        stats.report("undirected");
        (Self { neighbors }, stats)
    }

    /// Build over the union of all edge sources
    pub fn from_snapshot(graph: &GraphSnapshot) -> (Self, AdjacencyStats) {
        Self::from_edges(graph, graph.edges())
    }

    /// Build directly from title pairs (no snapshot filtering besides self-loops)
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut neighbors: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (a, b) in pairs {
            let (a, b) = (a.into(), b.into());
            if a == b {
                continue;
            }
            neighbors.entry(a.clone()).or_default().insert(b.clone());
            neighbors.entry(b).or_default().insert(a);
        }
        Self { neighbors }
    }

    /// Neighbors of a title, if it has any edge
    pub fn neighbors(&self, title: &str) -> Option<&BTreeSet<String>> {
        self.neighbors.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.neighbors.contains_key(title)
    }

    /// Titles with at least one edge, sorted
    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.neighbors.keys()
    }

    /// (title, neighbors) pairs, sorted by title
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.neighbors.iter()
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn degree(&self, title: &str) -> usize {
        self.neighbors.get(title).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// One shortest path from `source` to `target` with at most `max_depth` edges.
    ///
    /// Ties resolve by BFS discovery order over sorted neighbors. Returns
    /// `[source]` when both ends coincide and `None` when either end has no
    /// edge or no path fits the bound.
    pub fn shortest_path(
        &self,
        source: &str,
        target: &str,
        max_depth: usize,
    ) -> Option<Vec<String>> {
        if source == target {
            return self.contains(source).then(|| vec![source.to_string()]);
        }
        if !self.contains(source) || !self.contains(target) {
            return None;
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        parent.insert(source, source);
        queue.push_back((source, 0));

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let Some(neighbors) = self.neighbors.get(node) else {
                continue;
            };
            for next in neighbors {
                let next = next.as_str();
                if parent.contains_key(next) {
                    continue;
                }
                parent.insert(next, node);
                if next == target {
                    let mut path = vec![target.to_string()];
                    let mut current = target;
                    while current != source {
                        current = parent[current];
                        path.push(current.to_string());
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back((next, depth + 1));
            }
        }

        None
    }
}
