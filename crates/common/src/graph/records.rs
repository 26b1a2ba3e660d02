//! Raw and validated input records
//!
//! Raw records mirror whatever the ingestion stage wrote; every field is
//! optional. Conversion into [`NodeRecord`] / [`EdgeRecord`] is the only way
//! into a snapshot and rejects records that are missing required fields.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Node type used when the record carries none
pub const DEFAULT_NODE_KIND: &str = "entity";

/// Edge type used when the record carries none
pub const DEFAULT_EDGE_KIND: &str = "related";

/// Node as written by the ingestion stage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    pub title: Option<String>,

    #[serde(alias = "type")]
    pub label: Option<String>,

    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,

    /// Any other field (page id, infobox keys, previously attached metrics)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Edge as written by the ingestion or enrichment stage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEdge {
    pub source: Option<String>,
    pub target: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub evidence: Option<String>,
}

/// Introductory and full text for one node (one JSON Lines record)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeText {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub intro_text: String,

    #[serde(default)]
    pub plain_text: String,
}

/// External news-like document (one JSON Lines record)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Document {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub url: Option<String>,
}

/// Validated node record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NodeRecord {
    #[validate(length(min = 1))]
    pub title: String,

    #[validate(length(min = 1))]
    pub kind: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Validated edge record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_not_self_loop"))]
pub struct EdgeRecord {
    #[validate(length(min = 1))]
    pub source: String,

    #[validate(length(min = 1))]
    pub target: String,

    #[validate(length(min = 1))]
    pub kind: String,

    pub evidence: Option<String>,
}

fn validate_not_self_loop(edge: &EdgeRecord) -> std::result::Result<(), ValidationError> {
    if edge.source == edge.target {
        return Err(ValidationError::new("self_loop"));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TryFrom<RawNode> for NodeRecord {
    type Error = AppError;

    fn try_from(raw: RawNode) -> Result<Self> {
        let title = non_blank(raw.title).ok_or_else(|| AppError::MissingField {
            field: "title".to_string(),
        })?;
        let kind = non_blank(raw.label).unwrap_or_else(|| DEFAULT_NODE_KIND.to_string());

        let mut attributes = raw.attributes.unwrap_or_default();
        for (key, value) in raw.extra {
            attributes.entry(key).or_insert(value);
        }

        let record = NodeRecord { title, kind, attributes };
        record.validate()?;
        Ok(record)
    }
}

impl TryFrom<RawEdge> for EdgeRecord {
    type Error = AppError;

    fn try_from(raw: RawEdge) -> Result<Self> {
        let source = non_blank(raw.source).ok_or_else(|| AppError::MissingField {
            field: "source".to_string(),
        })?;
        let target = non_blank(raw.target).ok_or_else(|| AppError::MissingField {
            field: "target".to_string(),
        })?;
        if source == target {
            return Err(AppError::SelfLoop { title: source });
        }

        let record = EdgeRecord {
            source,
            target,
            kind: non_blank(raw.kind).unwrap_or_else(|| DEFAULT_EDGE_KIND.to_string()),
            evidence: raw.evidence.filter(|e| !e.trim().is_empty()),
        };
        record.validate()?;
        Ok(record)
    }
}

impl EdgeRecord {
    /// Convenience constructor for already-trusted data
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

impl NodeRecord {
    /// Convenience constructor for already-trusted data
    pub fn new(title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: kind.into(),
            attributes: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_defaults_kind_and_keeps_extra_fields() {
        let raw: RawNode = serde_json::from_value(json!({
            "title": "Minh Mạng",
            "page_id": 12345,
        }))
        .unwrap();

        let node = NodeRecord::try_from(raw).unwrap();
        assert_eq!(node.kind, DEFAULT_NODE_KIND);
        assert_eq!(node.attributes["page_id"], json!(12345));
    }

    #[test]
    fn test_node_without_title_rejected() {
        let raw: RawNode = serde_json::from_value(json!({ "label": "person" })).unwrap();
        let err = NodeRecord::try_from(raw).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "title"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_blank_title_rejected() {
        let raw: RawNode = serde_json::from_value(json!({ "title": "   " })).unwrap();
        assert!(NodeRecord::try_from(raw).is_err());
    }

    #[test]
    fn test_edge_self_loop_rejected() {
        let raw: RawEdge = serde_json::from_value(json!({
            "source": "Huế",
            "target": "Huế",
            "type": "located_in",
        }))
        .unwrap();
        let err = EdgeRecord::try_from(raw).unwrap_err();
        assert!(matches!(err, AppError::SelfLoop { .. }));
    }

    #[test]
    fn test_edge_schema_validation_catches_self_loop() {
        let edge = EdgeRecord::new("A", "A", "kinship");
        assert!(edge.validate().is_err());
    }

    #[test]
    fn test_edge_type_defaults() {
        let raw: RawEdge = serde_json::from_value(json!({
            "source": "Gia Long",
            "target": "Minh Mạng",
            "evidence": "",
        }))
        .unwrap();
        let edge = EdgeRecord::try_from(raw).unwrap();
        assert_eq!(edge.kind, DEFAULT_EDGE_KIND);
        assert_eq!(edge.evidence, None);
    }
}
