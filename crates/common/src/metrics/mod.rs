//! Metrics and observability utilities
//!
//! Describes the Chronograph metric families and provides small recording
//! helpers. Without an installed recorder every helper is a no-op, so library
//! code can call them unconditionally.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};

/// Metrics prefix for all Chronograph metrics
pub const METRICS_PREFIX: &str = "chronograph";

/// Buckets for batch stage duration (in seconds)
pub const STAGE_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
    30.00,  // 30s
    120.0,  // 2m
];

/// Buckets for per-question retrieval latency (in seconds)
pub const RETRIEVAL_BUCKETS: &[f64] = &[
    0.0005, // 0.5ms
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
];

/// Histogram names paired with their bucket boundaries, for exporter setup
pub fn histogram_buckets() -> [(String, &'static [f64]); 2] {
    [
        (format!("{}_stage_duration_seconds", METRICS_PREFIX), STAGE_BUCKETS),
        (format!("{}_retrieval_duration_seconds", METRICS_PREFIX), RETRIEVAL_BUCKETS),
    ]
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Load boundary
    describe_counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Input records skipped at the load boundary"
    );

    describe_counter!(
        format!("{}_edges_dropped_total", METRICS_PREFIX),
        Unit::Count,
        "Edges dropped while building adjacency views"
    );

    // Analytics
    describe_gauge!(
        format!("{}_pagerank_iterations", METRICS_PREFIX),
        Unit::Count,
        "Power iterations used by the last PageRank run"
    );

    describe_gauge!(
        format!("{}_label_propagation_epochs", METRICS_PREFIX),
        Unit::Count,
        "Epochs used by the last label propagation run"
    );

    describe_gauge!(
        format!("{}_communities_count", METRICS_PREFIX),
        Unit::Count,
        "Communities found by the last label propagation run"
    );

    describe_histogram!(
        format!("{}_stage_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Batch stage duration in seconds"
    );

    // Retrieval
    describe_counter!(
        format!("{}_retrieval_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Questions answered by the retrieval index"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Context assembly latency in seconds"
    );

    describe_gauge!(
        format!("{}_retrieval_seed_count", METRICS_PREFIX),
        Unit::Count,
        "Seeds found for the last question"
    );

    describe_gauge!(
        format!("{}_retrieval_node_count", METRICS_PREFIX),
        Unit::Count,
        "Nodes selected for the last question"
    );

    tracing::info!("Metrics registered");
}

/// Record a skipped input record
pub fn record_skip(kind: &str) {
    counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record edges dropped during adjacency construction
pub fn record_dropped_edges(reason: &str, count: usize) {
    if count == 0 {
        return;
    }
    counter!(
        format!("{}_edges_dropped_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(count as u64);
}

/// Record a finished batch stage
pub fn record_stage(stage: &str, duration_secs: f64) {
    histogram!(
        format!("{}_stage_duration_seconds", METRICS_PREFIX),
        "stage" => stage.to_string()
    )
    .record(duration_secs);
}

/// Record PageRank convergence
pub fn record_pagerank(iterations: usize) {
    gauge!(format!("{}_pagerank_iterations", METRICS_PREFIX)).set(iterations as f64);
}

/// Record label propagation convergence
pub fn record_communities(epochs: usize, communities: usize) {
    gauge!(format!("{}_label_propagation_epochs", METRICS_PREFIX)).set(epochs as f64);
    gauge!(format!("{}_communities_count", METRICS_PREFIX)).set(communities as f64);
}

/// Record one retrieval request
pub fn record_retrieval(duration_secs: f64, outcome: &str, seed_count: usize, node_count: usize) {
    counter!(
        format!("{}_retrieval_requests_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_retrieval_seed_count", METRICS_PREFIX)).set(seed_count as f64);
    gauge!(format!("{}_retrieval_node_count", METRICS_PREFIX)).set(node_count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [STAGE_BUCKETS, RETRIEVAL_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_histogram_buckets_cover_duration_metrics() {
        let names: Vec<String> = histogram_buckets().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "chronograph_stage_duration_seconds",
                "chronograph_retrieval_duration_seconds"
            ]
        );
    }

    #[test]
    fn test_helpers_without_recorder() {
        record_skip("node");
        record_dropped_edges("unknown_node", 3);
        record_stage("pagerank", 0.01);
        record_retrieval(0.002, "assembled", 2, 10);
        // Just verify it runs without panic
    }
}
