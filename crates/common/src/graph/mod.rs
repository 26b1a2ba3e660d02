//! Property graph data model
//!
//! Provides:
//! - Validated node and edge records (the load boundary)
//! - Immutable graph snapshots assembled from several edge sources
//! - Directed and undirected adjacency views
//! - Per-node metrics attached by the analytics stages

mod adjacency;
mod records;
mod snapshot;

pub use adjacency::{AdjacencyStats, DirectedAdjacency, UndirectedAdjacency};
pub use records::{
    Document, EdgeRecord, NodeRecord, NodeText, RawEdge, RawNode, DEFAULT_EDGE_KIND,
    DEFAULT_NODE_KIND,
};
pub use snapshot::{EdgeSet, GraphSnapshot, SnapshotBuilder};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Community id reserved for nodes without any edge
pub const ISOLATED_COMMUNITY: u32 = 0;

/// Degree counts of one node within one edge source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDegree {
    pub out_degree: usize,
    pub in_degree: usize,
    pub total_degree: usize,

    /// Position by total degree (1 = highest), 0 when the node has no edge in this source
    pub rank: usize,
}

/// Metrics attached to a node by the analytics stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Per edge source, keyed by source name
    #[serde(default)]
    pub degrees: BTreeMap<String, SourceDegree>,

    #[serde(default)]
    pub combined_total_degree: usize,

    #[serde(default)]
    pub combined_rank: usize,

    /// Share of total rank mass (0.0 - 1.0)
    #[serde(default)]
    pub pagerank: f64,

    #[serde(default)]
    pub pagerank_rank: usize,

    /// 1 = largest community, 0 = isolated node
    #[serde(default)]
    pub community_id: u32,

    #[serde(default)]
    pub community_size: usize,

    /// Internal propagation label (title of the label's origin node)
    #[serde(default)]
    pub community_label: Option<String>,
}

impl NodeMetrics {
    /// Recover metrics from a previously annotated record's flat fields
    pub fn from_attributes(attributes: &Map<String, Value>) -> Self {
        let as_usize = |key: &str| {
            attributes
                .get(key)
                .and_then(Value::as_u64)
                .map(|v| v as usize)
                .unwrap_or(0)
        };

        let mut degrees = BTreeMap::new();
        for key in attributes.keys() {
            if let Some(source) = key.strip_suffix("_total_degree") {
                if source == "combined" {
                    continue;
                }
                degrees.insert(
                    source.to_string(),
                    SourceDegree {
                        out_degree: as_usize(&format!("{source}_out_degree")),
                        in_degree: as_usize(&format!("{source}_in_degree")),
                        total_degree: as_usize(key),
                        rank: as_usize(&format!("{source}_rank")),
                    },
                );
            }
        }

        Self {
            degrees,
            combined_total_degree: as_usize("combined_total_degree"),
            combined_rank: as_usize("combined_rank"),
            pagerank: attributes.get("pagerank").and_then(Value::as_f64).unwrap_or(0.0),
            pagerank_rank: as_usize("pagerank_rank"),
            community_id: attributes
                .get("community_id")
                .and_then(Value::as_u64)
                .map(|v| v as u32)
                .unwrap_or(ISOLATED_COMMUNITY),
            community_size: attributes
                .get("community_size")
                .and_then(Value::as_u64)
                .map(|v| v as usize)
                .unwrap_or(1),
            community_label: attributes
                .get("community_label")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Flat field form, as written into the annotated node collection
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for (source, degree) in &self.degrees {
            fields.insert(format!("{source}_out_degree"), degree.out_degree.into());
            fields.insert(format!("{source}_in_degree"), degree.in_degree.into());
            fields.insert(format!("{source}_total_degree"), degree.total_degree.into());
            fields.insert(format!("{source}_rank"), degree.rank.into());
        }
        fields.insert("combined_total_degree".into(), self.combined_total_degree.into());
        fields.insert("combined_rank".into(), self.combined_rank.into());
        fields.insert("pagerank".into(), self.pagerank.into());
        fields.insert("pagerank_rank".into(), self.pagerank_rank.into());
        fields.insert("community_id".into(), self.community_id.into());
        fields.insert("community_size".into(), self.community_size.into());
        if let Some(label) = &self.community_label {
            fields.insert("community_label".into(), label.clone().into());
        }
        fields
    }
}

/// Entity in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique title (primary key)
    pub title: String,

    /// Category tag (person, ruler, place, event, ...)
    pub kind: String,

    /// Free-form attributes from ingestion
    pub attributes: Map<String, Value>,

    /// Derived metrics
    pub metrics: NodeMetrics,
}

impl Node {
    pub fn from_record(record: NodeRecord) -> Self {
        let metrics = NodeMetrics::from_attributes(&record.attributes);
        Self {
            title: record.title,
            kind: record.kind,
            attributes: record.attributes,
            metrics,
        }
    }

    /// Flat JSON object: attributes, then identity, then metrics (metrics win)
    pub fn to_annotated_json(&self) -> Value {
        let mut object = self.attributes.clone();
        object.insert("title".into(), self.title.clone().into());
        object.insert("label".into(), self.kind.clone().into());
        for (key, value) in self.metrics.to_fields() {
            object.insert(key, value);
        }
        Value::Object(object)
    }
}
