//! Dataset loading and writing
//!
//! Node and edge collections are JSON arrays; the text corpus and the
//! document collection are JSON Lines. Malformed records are skipped and
//! counted in a [`LoadReport`]; only an unreadable file or a collection of
//! the wrong shape fails the whole load.

use crate::config::DataConfig;
use crate::errors::{AppError, Result};
use crate::graph::{Document, EdgeRecord, GraphSnapshot, NodeRecord, NodeText, RawEdge, RawNode};
use crate::metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-collection load summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub collection: String,
    pub loaded: usize,
    pub skipped: usize,
}

impl LoadReport {
    fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            ..Default::default()
        }
    }

    fn skip(&mut self, line: usize, reason: &dyn std::fmt::Display) {
        debug!(collection = %self.collection, line, %reason, "Record skipped");
        self.skipped += 1;
        metrics::record_skip(&self.collection);
    }

    fn log(&self) {
        if self.skipped > 0 {
            warn!(
                collection = %self.collection,
                loaded = self.loaded,
                skipped = self.skipped,
                "Collection loaded with skipped records"
            );
        } else {
            info!(collection = %self.collection, loaded = self.loaded, "Collection loaded");
        }
    }
}

fn read_array(path: &Path) -> Result<Vec<Value>> {
    let reader = BufReader::new(fs::File::open(path)?);
    match serde_json::from_reader(reader)? {
        Value::Array(items) => Ok(items),
        other => Err(AppError::InvalidFormat {
            message: format!(
                "{}: expected a JSON array, found {}",
                path.display(),
                json_kind(&other)
            ),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert each array element through its raw form into a validated record
fn load_records<R, T>(path: &Path, collection: &str) -> Result<(Vec<T>, LoadReport)>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = AppError>,
{
    let mut report = LoadReport::new(collection);
    let mut records = Vec::new();

    for (i, item) in read_array(path)?.into_iter().enumerate() {
        let raw: R = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                report.skip(i, &e);
                continue;
            }
        };
        match T::try_from(raw) {
            Ok(record) => {
                records.push(record);
                report.loaded += 1;
            }
            Err(e) if e.is_input_error() => report.skip(i, &e),
            Err(e) => return Err(e),
        }
    }

    report.log();
    Ok((records, report))
}

fn load_lines<T: DeserializeOwned>(path: &Path, collection: &str) -> Result<(Vec<T>, LoadReport)> {
    let mut report = LoadReport::new(collection);
    let mut records = Vec::new();
    let reader = BufReader::new(fs::File::open(path)?);

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => {
                records.push(record);
                report.loaded += 1;
            }
            Err(e) => report.skip(i + 1, &e),
        }
    }

    Ok((records, report))
}

/// Load a node collection
pub fn load_nodes(path: impl AsRef<Path>) -> Result<(Vec<NodeRecord>, LoadReport)> {
    load_records::<RawNode, NodeRecord>(path.as_ref(), "nodes")
}

/// Load one edge collection
pub fn load_edges(path: impl AsRef<Path>, source: &str) -> Result<(Vec<EdgeRecord>, LoadReport)> {
    load_records::<RawEdge, EdgeRecord>(path.as_ref(), &format!("edges:{source}"))
}

/// Load the per-node text corpus; records without a title are skipped
pub fn load_node_texts(path: impl AsRef<Path>) -> Result<(Vec<NodeText>, LoadReport)> {
    let (texts, mut report) = load_lines::<NodeText>(path.as_ref(), "texts")?;
    let before = texts.len();
    let texts: Vec<NodeText> = texts.into_iter().filter(|t| !t.title.trim().is_empty()).collect();
    report.loaded = texts.len();
    report.skipped += before - texts.len();
    report.log();
    Ok((texts, report))
}

/// Load the document collection; a missing file yields an empty collection
pub fn load_documents(path: impl AsRef<Path>) -> Result<(Vec<Document>, LoadReport)> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "Document collection not found, continuing without it");
        return Ok((Vec::new(), LoadReport::new("documents")));
    }
    let (documents, report) = load_lines::<Document>(path, "documents")?;
    report.log();
    Ok((documents, report))
}

/// Load nodes and every configured edge source into a snapshot
pub fn load_snapshot(
    data: &DataConfig,
    nodes_path: &str,
) -> Result<(GraphSnapshot, Vec<LoadReport>)> {
    let (nodes, node_report) = load_nodes(nodes_path)?;
    let mut reports = vec![node_report];

    let mut builder = GraphSnapshot::builder().nodes(nodes);
    for source in &data.edge_sources {
        let (edges, report) = load_edges(&source.path, &source.name)?;
        builder.add_edge_source(&source.name, edges);
        reports.push(report);
    }

    Ok((builder.build(), reports))
}

/// Write any serializable value as pretty JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Write the annotated node collection (one flat object per node, load order)
pub fn write_annotated_nodes(path: impl AsRef<Path>, graph: &GraphSnapshot) -> Result<()> {
    let nodes: Vec<Value> = graph.nodes().iter().map(|n| n.to_annotated_json()).collect();
    write_json(path.as_ref(), &nodes)?;
    info!(path = %path.as_ref().display(), nodes = nodes.len(), "Annotated nodes written");
    Ok(())
}
