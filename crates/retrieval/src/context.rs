//! Context bundle assembly
//!
//! Provides:
//! - The per-question bundle (seeds, nodes, paths, text)
//! - Node ordering by seed community and PageRank
//! - Rendering of the graph-paths, node and news sections

use crate::traversal::GraphPath;
use chronograph_common::graph::ISOLATED_COMMUNITY;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Node summary carried in a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleNode {
    pub title: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub pagerank: f64,
    pub community_id: u32,
}

/// Retrieved evidence for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    /// Seed titles in seed-search order
    pub seeds: Vec<String>,

    /// Selected nodes, most relevant first
    pub nodes: Vec<BundleNode>,

    /// Text handed to the answer generator
    pub context: String,

    /// Seed-to-seed chains
    pub paths: Vec<GraphPath>,
}

impl ContextBundle {
    /// Whether any text was assembled
    pub fn has_evidence(&self) -> bool {
        !self.context.trim().is_empty()
    }
}

/// Outcome of one retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    /// No node title matched the question
    NoSeeds,

    /// Seeds were found; the bundle may still carry no text
    Assembled(ContextBundle),
}

impl RetrievalOutcome {
    /// The bundle, or the empty bundle when nothing matched
    pub fn into_bundle(self) -> ContextBundle {
        match self {
            RetrievalOutcome::NoSeeds => ContextBundle::default(),
            RetrievalOutcome::Assembled(bundle) => bundle,
        }
    }

    pub fn bundle(&self) -> Option<&ContextBundle> {
        match self {
            RetrievalOutcome::NoSeeds => None,
            RetrievalOutcome::Assembled(bundle) => Some(bundle),
        }
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalOutcome::NoSeeds => "no_seeds",
            RetrievalOutcome::Assembled(b) if b.has_evidence() => "assembled",
            RetrievalOutcome::Assembled(_) => "empty_context",
        }
    }
}

/// Whether `community` is shared with any seed community.
///
/// Isolated nodes share nothing, so callers flag seeds separately.
pub fn shares_seed_community(community: u32, seed_communities: &[u32]) -> bool {
    community != ISOLATED_COMMUNITY && seed_communities.contains(&community)
}

/// Order nodes by (same community as a seed, PageRank) descending, then title
pub fn order_nodes(nodes: &mut [(BundleNode, bool)]) {
    nodes.sort_by(|(a, a_same), (b, b_same)| {
        b_same
            .cmp(a_same)
            .then_with(|| b.pagerank.total_cmp(&a.pagerank))
            .then_with(|| a.title.cmp(&b.title))
    });
}

/// Incrementally builds the context text
#[derive(Debug, Default)]
pub struct ContextWriter {
    sections: Vec<String>,
}

impl ContextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[GRAPH PATHS]` block; nothing when there are no paths
    pub fn paths(&mut self, paths: &[GraphPath]) -> &mut Self {
        if paths.is_empty() {
            return self;
        }
        let mut block = String::from("[GRAPH PATHS]");
        for path in paths {
            let _ = write!(block, "\n- {} ~ {}: {}", path.source, path.target, path.chain());
        }
        self.sections.push(block);
        self
    }

    /// `[NODE]` block followed by the intro text
    pub fn node(&mut self, node: &BundleNode, intro: &str) -> &mut Self {
        self.sections.push(format!(
            "[NODE] {} ({}) (PageRank={:.4}, Community={})\n{}",
            node.title,
            node.kind,
            node.pagerank,
            node.community_id,
            intro.trim()
        ));
        self
    }

    /// `[NEWS]` block followed by the document text
    pub fn news(&mut self, title: &str, text: &str) -> &mut Self {
        self.sections.push(format!("[NEWS] {}\n{}", title, text.trim()));
        self
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Sections separated by blank lines
    pub fn finish(self) -> String {
        self.sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(title: &str, pagerank: f64, community_id: u32) -> BundleNode {
        BundleNode {
            title: title.to_string(),
            kind: "ruler".to_string(),
            pagerank,
            community_id,
        }
    }

    #[test]
    fn test_ordering_prefers_seed_community_then_pagerank() {
        let mut nodes = vec![
            (node("Huế", 0.9, 2), false),
            (node("Thiệu Trị", 0.1, 1), true),
            (node("Gia Long", 0.3, 1), true),
            (node("Bắc Hà", 0.3, 1), true),
        ];
        order_nodes(&mut nodes);

        let titles: Vec<&str> = nodes.iter().map(|(n, _)| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Bắc Hà", "Gia Long", "Thiệu Trị", "Huế"]);
    }

    #[test]
    fn test_nan_pagerank_sorts_above_finite_scores() {
        let mut nodes = vec![
            (node("Huế", 0.2, 1), true),
            (node("Gia Long", f64::NAN.abs(), 1), true),
            (node("Bắc Hà", 0.5, 1), true),
        ];
        order_nodes(&mut nodes);

        let titles: Vec<&str> = nodes.iter().map(|(n, _)| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Gia Long", "Bắc Hà", "Huế"]);
    }

    #[test]
    fn test_isolated_community_never_shared() {
        assert!(!shares_seed_community(ISOLATED_COMMUNITY, &[ISOLATED_COMMUNITY, 3]));
        assert!(shares_seed_community(3, &[ISOLATED_COMMUNITY, 3]));
        assert!(!shares_seed_community(4, &[3]));
    }

    #[test]
    fn test_writer_layout() {
        let paths = vec![GraphPath {
            source: "Gia Long".into(),
            target: "Minh Mạng".into(),
            path: vec!["Gia Long".into(), "Minh Mạng".into()],
        }];
        let mut writer = ContextWriter::new();
        writer
            .paths(&paths)
            .node(&node("Minh Mạng", 0.12345, 1), "Vị vua thứ hai. ")
            .news("Triều Nguyễn", "Bài báo");

        assert_eq!(writer.section_count(), 3);
        assert_eq!(
            writer.finish(),
            "[GRAPH PATHS]\n- Gia Long ~ Minh Mạng: Gia Long -> Minh Mạng\n\n\
             [NODE] Minh Mạng (ruler) (PageRank=0.1235, Community=1)\nVị vua thứ hai.\n\n\
             [NEWS] Triều Nguyễn\nBài báo"
        );
    }

    #[test]
    fn test_empty_paths_emit_nothing() {
        let mut writer = ContextWriter::new();
        writer.paths(&[]);
        assert_eq!(writer.finish(), "");
    }

    #[test]
    fn test_no_seeds_maps_to_empty_bundle() {
        let bundle = RetrievalOutcome::NoSeeds.into_bundle();
        assert_eq!(bundle, ContextBundle::default());
        assert!(!bundle.has_evidence());
        assert_eq!(RetrievalOutcome::NoSeeds.kind(), "no_seeds");

        let seeded = RetrievalOutcome::Assembled(ContextBundle {
            seeds: vec!["Huế".into()],
            ..Default::default()
        });
        assert_eq!(seeded.kind(), "empty_context");
        assert!(seeded.bundle().is_some());
    }

    #[test]
    fn test_bundle_node_serializes_type() {
        let json = serde_json::to_value(node("Huế", 0.5, 2)).unwrap();
        assert_eq!(json["type"], "ruler");
        assert!(json.get("kind").is_none());
    }
}
