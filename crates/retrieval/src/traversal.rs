//! Bounded subgraph expansion and seed-to-seed paths

use chronograph_common::graph::UndirectedAdjacency;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One multi-hop chain between two seeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPath {
    pub source: String,
    pub target: String,

    /// Titles from `source` to `target` inclusive
    pub path: Vec<String>,
}

impl GraphPath {
    /// Number of edges
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// `A -> B -> C`
    pub fn chain(&self) -> String {
        self.path.join(" -> ")
    }
}

/// Multi-source BFS from `seeds`, bounded by depth and visited-set size.
///
/// Seeds are visited first (at most `max_nodes` of them); the result is in
/// discovery order.
pub fn expand(
    adjacency: &UndirectedAdjacency,
    seeds: &[String],
    max_depth: usize,
    max_nodes: usize,
) -> Vec<String> {
    let mut visited: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    for seed in seeds {
        if visited.len() >= max_nodes {
            break;
        }
        if seen.insert(seed.as_str()) {
            visited.push(seed.as_str());
            queue.push_back((seed.as_str(), 0));
        }
    }

    'bfs: while let Some((node, depth)) = queue.pop_front() {
        if visited.len() >= max_nodes {
            break;
        }
        if depth >= max_depth {
            continue;
        }
        for next in adjacency.neighbors(node).into_iter().flatten() {
            if seen.insert(next.as_str()) {
                visited.push(next.as_str());
                queue.push_back((next.as_str(), depth + 1));
                if visited.len() >= max_nodes {
                    break 'bfs;
                }
            }
        }
    }

    visited.into_iter().map(str::to_string).collect()
}

/// One shortest path per unordered pair of distinct seeds within `max_depth` edges
pub fn seed_paths(
    adjacency: &UndirectedAdjacency,
    seeds: &[String],
    max_depth: usize,
) -> Vec<GraphPath> {
    let mut present: Vec<&str> = Vec::new();
    for seed in seeds {
        if adjacency.contains(seed) && !present.contains(&seed.as_str()) {
            present.push(seed.as_str());
        }
    }

    let mut paths = Vec::new();
    for (i, &source) in present.iter().enumerate() {
        for &target in &present[i + 1..] {
            if let Some(path) = adjacency.shortest_path(source, target, max_depth) {
                if path.len() > 1 {
                    paths.push(GraphPath {
                        source: source.to_string(),
                        target: target.to_string(),
                        path,
                    });
                }
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_chain() -> UndirectedAdjacency {
        // hub -- a1..a4, and hub -- x -- y -- z
        UndirectedAdjacency::from_pairs([
            ("hub", "a1"),
            ("hub", "a2"),
            ("hub", "a3"),
            ("hub", "a4"),
            ("hub", "x"),
            ("x", "y"),
            ("y", "z"),
        ])
    }

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expand_respects_depth() {
        let visited = expand(&star_chain(), &titles(&["hub"]), 1, 100);
        assert_eq!(visited.len(), 6);
        assert!(!visited.contains(&"y".to_string()));

        let visited = expand(&star_chain(), &titles(&["hub"]), 2, 100);
        assert!(visited.contains(&"y".to_string()));
        assert!(!visited.contains(&"z".to_string()));
    }

    #[test]
    fn test_expand_respects_size() {
        let visited = expand(&star_chain(), &titles(&["hub"]), 5, 3);
        assert_eq!(visited.len(), 3);
        assert_eq!(visited[0], "hub");
    }

    #[test]
    fn test_expand_truncates_seed_list() {
        let visited = expand(&star_chain(), &titles(&["a1", "a2", "a3"]), 2, 2);
        assert_eq!(visited, titles(&["a1", "a2"]));
        assert!(expand(&star_chain(), &titles(&["a1"]), 2, 0).is_empty());
    }

    #[test]
    fn test_expand_keeps_isolated_seed() {
        let visited = expand(&star_chain(), &titles(&["lonely", "z"]), 1, 10);
        assert_eq!(visited, titles(&["lonely", "z", "y"]));
    }

    #[test]
    fn test_depth_zero_returns_seeds_only() {
        let visited = expand(&star_chain(), &titles(&["hub", "z"]), 0, 10);
        assert_eq!(visited, titles(&["hub", "z"]));
    }

    #[test]
    fn test_direct_edge_gives_single_hop_path() {
        let adjacency = UndirectedAdjacency::from_pairs([("Gia Long", "Minh Mạng")]);
        let paths = seed_paths(&adjacency, &titles(&["Gia Long", "Minh Mạng"]), 3);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].hops(), 1);
        assert_eq!(paths[0].chain(), "Gia Long -> Minh Mạng");
    }

    #[test]
    fn test_pairs_beyond_depth_are_omitted() {
        let paths = seed_paths(&star_chain(), &titles(&["a1", "z", "x", "ghost"]), 3);

        // a1-z needs 4 hops
        assert!(paths.iter().all(|p| !(p.source == "a1" && p.target == "z")));
        assert!(paths.iter().all(|p| p.hops() <= 3));
        assert_eq!(paths.len(), 2);
    }
}
