//! Chronograph Analyze
//!
//! Batch driver:
//! - Loads the node collection and every configured edge source
//! - Runs degree ranking, PageRank and community detection
//! - Writes the annotated nodes and the small-world report

use anyhow::Context;
use chronograph_analytics::AnalyticsPipeline;
use chronograph_common::config::{AppConfig, ObservabilityConfig};
use chronograph_common::{io, metrics, VERSION};
use clap::Parser;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rank, cluster and profile the historical entity graph
#[derive(Debug, Parser)]
#[command(name = "analyze", version, about)]
struct Cli {
    /// Configuration file (defaults to config/default + APP__ environment)
    #[arg(short, long)]
    config: Option<String>,

    /// Nodes listed in the PageRank summary
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.observability);
    let metrics_handle = init_metrics(&config.observability)?;

    info!(version = VERSION, service = %config.observability.service_name, "Starting analyze");

    let (graph, _) = io::load_snapshot(&config.data, &config.data.nodes_path)
        .context("Failed to load graph snapshot")?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        fingerprint = %graph.fingerprint(),
        "Snapshot loaded"
    );

    let pipeline = AnalyticsPipeline::new(
        config.ranking.clone(),
        config.community.clone(),
        config.small_world.clone(),
    );
    let output = pipeline.run(&graph).context("Analytics pipeline failed")?;
    if !output.pagerank.converged {
        warn!(
            iterations = output.pagerank.iterations,
            delta = output.pagerank.delta,
            "PageRank stopped at the iteration cap"
        );
    }
    if !output.communities.converged {
        warn!(epochs = output.communities.epochs, "Label propagation stopped at the epoch cap");
    }

    io::write_annotated_nodes(&config.data.output_nodes_path, &output.graph)
        .with_context(|| format!("Failed to write {}", config.data.output_nodes_path))?;
    if let Some(report) = &output.report {
        io::write_json(&config.data.report_path, report)
            .with_context(|| format!("Failed to write {}", config.data.report_path))?;
    }

    for (i, position) in output.pagerank.order().into_iter().take(cli.top).enumerate() {
        let node = &output.graph.nodes()[position];
        info!(
            rank = i + 1,
            title = %node.title,
            pagerank = node.metrics.pagerank,
            community = node.metrics.community_id,
            "Top node"
        );
    }
    for community in output.communities.communities.iter().take(5) {
        info!(id = community.id, size = community.size(), label = %community.label, "Community");
    }
    if let Some(report) = &output.report {
        info!(
            average_path_length = report.average_path_length,
            reference = report.reference_path_length,
            giant_share = report.giant_component_share,
            "Small-world summary"
        );
    }

    if let Some(handle) = metrics_handle {
        flush_metrics(&handle, &config.observability)?;
    }

    info!("Analyze complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
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
    let handle = prometheus_builder()?
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    metrics::register_metrics();
    Ok(Some(handle))
}

/// Prometheus builder with explicit buckets for every duration histogram
fn prometheus_builder() -> anyhow::Result<PrometheusBuilder> {
    let mut builder = PrometheusBuilder::new();
    for (name, buckets) in metrics::histogram_buckets() {
        builder = builder
            .set_buckets_for_metric(Matcher::Full(name), buckets)
            .context("Invalid histogram buckets")?;
    }
    Ok(builder)
}

fn flush_metrics(handle: &PrometheusHandle, config: &ObservabilityConfig) -> anyhow::Result<()> {
    let rendered = handle.render();
    if config.metrics_path.is_empty() {
        info!(metrics = %rendered, "Metrics snapshot");
    } else {
        std::fs::write(&config.metrics_path, rendered)
            .with_context(|| format!("Failed to write {}", config.metrics_path))?;
        info!(path = %config.metrics_path, "Metrics written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_config_flag() {
        let cli = Cli::parse_from(["analyze", "--config", "config/test.toml", "--top", "3"]);
        assert_eq!(cli.config.as_deref(), Some("config/test.toml"));
        assert_eq!(cli.top, 3);
    }

    #[test]
    fn test_stage_histogram_renders_buckets() {
        let recorder = prometheus_builder().unwrap().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || metrics::record_stage("pagerank", 0.02));

        let rendered = handle.render();
        assert!(rendered.contains("chronograph_stage_duration_seconds_bucket"));
        assert!(rendered.contains("le=\"0.05\""));
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        let handle = init_metrics(&ObservabilityConfig::default()).unwrap();
        assert!(handle.is_none());
    }
}
