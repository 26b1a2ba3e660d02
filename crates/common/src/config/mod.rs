//! Configuration management for Chronograph
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values
//!
//! Library entry points take only the section they need; nothing here is
//! global.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Dataset locations
    #[serde(default)]
    pub data: DataConfig,

    /// PageRank parameters
    #[serde(default)]
    pub ranking: PageRankConfig,

    /// Label propagation parameters
    #[serde(default)]
    pub community: CommunityConfig,

    /// Small-world sampling parameters
    #[serde(default)]
    pub small_world: SmallWorldConfig,

    /// Question-time retrieval bounds
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Logging and metrics
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// A named edge collection on disk
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EdgeSourceConfig {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Node collection (JSON array)
    #[serde(default = "default_nodes_path")]
    pub nodes_path: String,

    /// Edge collections, unioned in order
    #[serde(default = "default_edge_sources")]
    pub edge_sources: Vec<EdgeSourceConfig>,

    /// Per-node text corpus (JSON Lines)
    #[serde(default = "default_texts_path")]
    pub texts_path: String,

    /// External documents (JSON Lines, optional)
    #[serde(default = "default_documents_path")]
    pub documents_path: String,

    /// Annotated node output
    #[serde(default = "default_output_nodes_path")]
    pub output_nodes_path: String,

    /// Small-world report output
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

/// PageRank configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageRankConfig {
    /// Damping factor (typically 0.85)
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Maximum iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence threshold on the L1 change between iterations
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommunityConfig {
    /// Maximum label propagation epochs
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,

    /// Seed for the per-epoch visitation shuffle.
    ///
    /// Membership depends on it: with the smallest-label tie-break a label can
    /// cross a single bridge edge, so some seeds merge two tightly knit groups
    /// that the default seed keeps apart.
    #[serde(default = "default_community_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmallWorldConfig {
    /// Number of BFS sources sampled from the giant component
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Seed for source sampling
    #[serde(default = "default_small_world_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Maximum seeds taken from the question
    #[serde(default = "default_seed_top_k")]
    pub seed_top_k: usize,

    /// Expansion depth from the seeds
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Expansion size cap
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Maximum edges in a seed-to-seed path
    #[serde(default = "default_path_max_depth")]
    pub path_max_depth: usize,

    /// Maximum external documents appended to the context
    #[serde(default = "default_max_news")]
    pub max_news: usize,

    /// Emit the graph paths section
    #[serde(default = "default_enabled")]
    pub include_paths: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Install a Prometheus recorder and dump it at exit
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Where to write the rendered metrics (empty: log only)
    #[serde(default)]
    pub metrics_path: String,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_nodes_path() -> String { "data/processed/network_nodes_enriched.json".to_string() }
fn default_edge_sources() -> Vec<EdgeSourceConfig> {
    vec![
        EdgeSourceConfig {
            name: "base".to_string(),
            path: "data/processed/network_relationships_full.json".to_string(),
        },
        EdgeSourceConfig {
            name: "text".to_string(),
            path: "data/processed/network_relationships_text_based.json".to_string(),
        },
    ]
}
fn default_texts_path() -> String { "data/processed/network_nodes_texts.jsonl".to_string() }
fn default_documents_path() -> String { "data/processed/news_corpus.jsonl".to_string() }
fn default_output_nodes_path() -> String { "data/processed/network_nodes_ranked.json".to_string() }
fn default_report_path() -> String { "data/processed/small_world_report.json".to_string() }
fn default_damping() -> f64 { 0.85 }
fn default_max_iterations() -> usize { 50 }
fn default_tolerance() -> f64 { 1e-6 }
fn default_max_epochs() -> usize { 50 }
fn default_community_seed() -> u64 { 42 }
fn default_sample_size() -> usize { 100 }
fn default_small_world_seed() -> u64 { 7 }
fn default_seed_top_k() -> usize { 5 }
fn default_max_depth() -> usize { 2 }
fn default_max_nodes() -> usize { 40 }
fn default_path_max_depth() -> usize { 3 }
fn default_max_news() -> usize { 5 }
fn default_enabled() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_enabled() -> bool { false }
fn default_service_name() -> String { "chronograph".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__MAX_NODES=60
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from an explicit file when given, otherwise the layered sources
    pub fn resolve(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::load(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            nodes_path: default_nodes_path(),
            edge_sources: default_edge_sources(),
            texts_path: default_texts_path(),
            documents_path: default_documents_path(),
            output_nodes_path: default_output_nodes_path(),
            report_path: default_report_path(),
        }
    }
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            max_epochs: default_max_epochs(),
            seed: default_community_seed(),
        }
    }
}

impl Default for SmallWorldConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            seed: default_small_world_seed(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            seed_top_k: default_seed_top_k(),
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
            path_max_depth: default_path_max_depth(),
            max_news: default_max_news(),
            include_paths: default_enabled(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_metrics_enabled(),
            metrics_path: String::new(),
            service_name: default_service_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ranking.damping, 0.85);
        assert_eq!(config.ranking.max_iterations, 50);
        assert_eq!(config.community.max_epochs, 50);
        assert_eq!(config.small_world.sample_size, 100);
        assert_eq!(config.retrieval.max_nodes, 40);
        assert_eq!(config.data.edge_sources.len(), 2);
        assert_eq!(config.data.edge_sources[0].name, "base");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[retrieval]\nmax_nodes = 12\n\n[community]\nseed = 9").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::from_file(&path).unwrap();

        assert_eq!(config.retrieval.max_nodes, 12);
        assert_eq!(config.retrieval.max_depth, 2);
        assert_eq!(config.community.seed, 9);
        assert_eq!(config.ranking.tolerance, 1e-6);
    }
}
