//! Chronograph Ask
//!
//! Loads the annotated graph, the text corpus and the document collection,
//! then prints the retrieved context for one question.

use anyhow::Context;
use chronograph_common::config::{AppConfig, ObservabilityConfig};
use chronograph_common::{io, metrics, VERSION};
use chronograph_retrieval::{RetrievalIndex, RetrievalOutcome};
use clap::Parser;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Retrieve graph context for a question
#[derive(Debug, Parser)]
#[command(name = "ask", version, about)]
struct Cli {
    /// Configuration file (defaults to config/default + APP__ environment)
    #[arg(short, long)]
    config: Option<String>,

    /// Print the bundle as JSON
    #[arg(long)]
    json: bool,

    /// The question
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.observability);
    let metrics_handle = init_metrics(&config.observability)?;

    info!(version = VERSION, "Starting ask");

    let (graph, _) = io::load_snapshot(&config.data, &config.data.output_nodes_path)
        .context("Failed to load annotated graph")?;
    let (texts, _) = io::load_node_texts(&config.data.texts_path)
        .with_context(|| format!("Failed to load {}", config.data.texts_path))?;
    let (documents, _) = io::load_documents(&config.data.documents_path)
        .with_context(|| format!("Failed to load {}", config.data.documents_path))?;

    let index = RetrievalIndex::new(&graph, texts, documents);
    info!(fingerprint = index.fingerprint(), "Index ready");

    let question = cli.question.join(" ");
    let outcome = index.retrieve(&question, &config.retrieval);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome.into_bundle())?);
    } else {
        print_text(&outcome);
    }

    if let Some(handle) = metrics_handle {
        let rendered = handle.render();
        if config.observability.metrics_path.is_empty() {
            info!(metrics = %rendered, "Metrics snapshot");
        } else {
            std::fs::write(&config.observability.metrics_path, rendered)
                .with_context(|| format!("Failed to write {}", config.observability.metrics_path))?;
        }
    }
    Ok(())
}

fn print_text(outcome: &RetrievalOutcome) {
    let Some(bundle) = outcome.bundle() else {
        println!("No entity in the graph matches this question.");
        return;
    };

    if bundle.has_evidence() {
        println!("{}\n", bundle.context);
    } else {
        println!("Seeds found, but none of the selected nodes has text.\n");
    }
    println!("Seeds: {}", bundle.seeds.join(", "));
    for path in &bundle.paths {
        println!("Path: {}", path.chain());
    }
    println!("Nodes: {}", bundle.nodes.len());
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.metrics_enabled {
        return Ok(None);
    }
    let mut builder = PrometheusBuilder::new();
    for (name, buckets) in metrics::histogram_buckets() {
        builder = builder
            .set_buckets_for_metric(Matcher::Full(name), buckets)
            .context("Invalid histogram buckets")?;
    }
    let handle = builder
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    metrics::register_metrics();
    Ok(Some(handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_collects_question_words() {
        let cli = Cli::parse_from(["ask", "--json", "Cha", "của", "Minh", "Mạng?"]);
        assert!(cli.json);
        assert_eq!(cli.question.join(" "), "Cha của Minh Mạng?");
    }

    #[test]
    fn test_cli_requires_question() {
        assert!(Cli::try_parse_from(["ask"]).is_err());
    }
}
