//! Retrieval index
//!
//! Built once from an annotated snapshot plus the text corpus and external
//! documents; read-only afterwards, so one instance can serve concurrent
//! questions behind an `Arc`.

use crate::context::{
    order_nodes, shares_seed_community, BundleNode, ContextBundle, ContextWriter, RetrievalOutcome,
};
use crate::seeds::{rank_seeds, SeedCandidate};
use crate::traversal::{self, GraphPath};
use chronograph_common::config::RetrievalConfig;
use chronograph_common::graph::{Document, GraphSnapshot, NodeText, UndirectedAdjacency};
use chronograph_common::metrics;
use chronograph_common::text::{count_token_hits, match_tokens, normalize_for_match};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Node fields retrieval needs
#[derive(Debug, Clone)]
struct IndexedNode {
    title: String,
    kind: String,
    normalized_title: String,
    pagerank: f64,
    community_id: u32,
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document: Document,
    normalized_title: String,
}

/// Immutable question-time index
#[derive(Debug, Clone)]
pub struct RetrievalIndex {
    nodes: Vec<IndexedNode>,
    positions: HashMap<String, usize>,
    adjacency: UndirectedAdjacency,
    intros: HashMap<String, String>,
    documents: Vec<IndexedDocument>,
    fingerprint: String,
}

impl RetrievalIndex {
    /// Build from an annotated snapshot.
    ///
    /// Texts for unknown titles are dropped; the first text per title wins.
    pub fn new(graph: &GraphSnapshot, texts: Vec<NodeText>, documents: Vec<Document>) -> Self {
        let nodes: Vec<IndexedNode> = graph
            .nodes()
            .iter()
            .map(|n| IndexedNode {
                title: n.title.clone(),
                kind: n.kind.clone(),
                normalized_title: normalize_for_match(&n.title),
                pagerank: n.metrics.pagerank,
                community_id: n.metrics.community_id,
            })
            .collect();
        let positions = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.title.clone(), i))
            .collect::<HashMap<_, _>>();

        let (adjacency, _) = UndirectedAdjacency::from_snapshot(graph);

        let mut intros = HashMap::new();
        let mut unknown_texts = 0usize;
        for text in texts {
            if !positions.contains_key(&text.title) {
                unknown_texts += 1;
                continue;
            }
            if !text.intro_text.trim().is_empty() {
                intros.entry(text.title).or_insert(text.intro_text);
            }
        }
        if unknown_texts > 0 {
            debug!(unknown_texts, "Texts for unknown titles dropped");
        }

        let documents: Vec<IndexedDocument> = documents
            .into_iter()
            .filter(|d| !d.title.trim().is_empty())
            .map(|document| IndexedDocument {
                normalized_title: normalize_for_match(&document.title),
                document,
            })
            .collect();

        info!(
            nodes = nodes.len(),
            edges = adjacency.edge_count(),
            texts = intros.len(),
            documents = documents.len(),
            "Retrieval index built"
        );

        Self {
            nodes,
            positions,
            adjacency,
            intros,
            documents,
            fingerprint: graph.fingerprint(),
        }
    }

    /// Fingerprint of the snapshot this index was built from
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.positions.contains_key(title)
    }

    pub fn adjacency(&self) -> &UndirectedAdjacency {
        &self.adjacency
    }

    /// Intro text of a node, if any
    pub fn intro(&self, title: &str) -> Option<&str> {
        self.intros.get(title).map(String::as_str)
    }

    /// Up to `top_k` seed titles for a question
    pub fn search_seeds(&self, question: &str, top_k: usize) -> Vec<String> {
        let tokens = match_tokens(question);
        rank_seeds(
            &tokens,
            self.nodes.iter().map(|n| SeedCandidate {
                title: &n.title,
                normalized_title: &n.normalized_title,
                pagerank: n.pagerank,
            }),
            top_k,
        )
    }

    /// Titles within `max_depth` hops of any known seed, at most `max_nodes`
    pub fn expand_subgraph(
        &self,
        seeds: &[String],
        max_depth: usize,
        max_nodes: usize,
    ) -> Vec<String> {
        let known: Vec<String> = seeds.iter().filter(|s| self.contains(s)).cloned().collect();
        traversal::expand(&self.adjacency, &known, max_depth, max_nodes)
    }

    /// Shortest chains between seed pairs within `max_depth` edges
    pub fn multi_hop_paths(&self, seeds: &[String], max_depth: usize) -> Vec<GraphPath> {
        traversal::seed_paths(&self.adjacency, seeds, max_depth)
    }

    /// Seeds, expansion, paths and text for one question
    pub fn retrieve(&self, question: &str, config: &RetrievalConfig) -> RetrievalOutcome {
        let start = Instant::now();
        let outcome = self.assemble(question, config);

        let (seed_count, node_count) = outcome
            .bundle()
            .map(|b| (b.seeds.len(), b.nodes.len()))
            .unwrap_or((0, 0));
        metrics::record_retrieval(
            start.elapsed().as_secs_f64(),
            outcome.kind(),
            seed_count,
            node_count,
        );
        info!(
            outcome = outcome.kind(),
            seeds = seed_count,
            nodes = node_count,
            "Question answered"
        );
        outcome
    }

    fn assemble(&self, question: &str, config: &RetrievalConfig) -> RetrievalOutcome {
        let seeds = self.search_seeds(question, config.seed_top_k);
        if seeds.is_empty() {
            return RetrievalOutcome::NoSeeds;
        }
        debug!(?seeds, "Seeds found");

        let selected = self.expand_subgraph(&seeds, config.max_depth, config.max_nodes);
        let seed_communities: Vec<u32> = seeds
            .iter()
            .filter_map(|s| self.node(s))
            .map(|n| n.community_id)
            .collect();

        let mut ranked: Vec<(BundleNode, bool)> = selected
            .iter()
            .filter_map(|title| self.node(title))
            .map(|n| {
                let same = seeds.contains(&n.title)
                    || shares_seed_community(n.community_id, &seed_communities);
                let summary = BundleNode {
                    title: n.title.clone(),
                    kind: n.kind.clone(),
                    pagerank: n.pagerank,
                    community_id: n.community_id,
                };
                (summary, same)
            })
            .collect();
        order_nodes(&mut ranked);
        let nodes: Vec<BundleNode> = ranked.into_iter().map(|(n, _)| n).collect();

        let paths = if config.include_paths {
            self.multi_hop_paths(&seeds, config.path_max_depth)
        } else {
            Vec::new()
        };

        let mut writer = ContextWriter::new();
        writer.paths(&paths);
        for node in &nodes {
            if let Some(intro) = self.intro(&node.title) {
                writer.node(node, intro);
            }
        }

        let tokens = match_tokens(question);
        let mut news = 0;
        for doc in &self.documents {
            if news >= config.max_news {
                break;
            }
            if count_token_hits(&tokens, &doc.normalized_title) == 0
                || doc.document.text.trim().is_empty()
            {
                continue;
            }
            writer.news(&doc.document.title, &doc.document.text);
            news += 1;
        }

        RetrievalOutcome::Assembled(ContextBundle {
            seeds,
            nodes,
            context: writer.finish(),
            paths,
        })
    }

    fn node(&self, title: &str) -> Option<&IndexedNode> {
        self.positions.get(title).map(|&i| &self.nodes[i])
    }
}
