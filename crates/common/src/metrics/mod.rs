//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all MeetPrep metrics
pub const METRICS_PREFIX: &str = "meetprep";

/// Histogram buckets for request and search latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s - default per-pattern timeout
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // History search metrics
    describe_counter!(
        format!("{}_history_searches_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of previous-meeting searches"
    );

    describe_histogram!(
        format!("{}_history_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Previous-meeting search latency in seconds"
    );

    describe_gauge!(
        format!("{}_history_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of ranked results returned by the last search"
    );

    // Pattern query metrics
    describe_counter!(
        format!("{}_pattern_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Store pattern queries by strategy and outcome"
    );

    describe_histogram!(
        format!("{}_pattern_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Store pattern query latency in seconds"
    );

    describe_counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Stored records skipped because their metadata could not be parsed"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a completed history search
pub fn record_search(duration_secs: f64, mode: &str, result_count: usize) {
    counter!(
        format!("{}_history_searches_total", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_history_search_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_history_results_count", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .set(result_count as f64);
}

/// Helper to record one store pattern query
pub fn record_pattern_query(duration_secs: f64, strategy: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_pattern_queries_total", METRICS_PREFIX),
        "strategy" => strategy.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_pattern_query_duration_seconds", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a stored record dropped for malformed metadata
pub fn record_skipped_record(store: &str) {
    counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        "store" => store.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
        assert!(LATENCY_BUCKETS.contains(&5.0));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/v1/meetings/previous");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // No recorder installed; recording is a no-op
    }

    #[test]
    fn test_helpers_without_recorder() {
        record_search(0.012, "ranked", 3);
        record_pattern_query(0.004, "company_specific", false);
        record_skipped_record("postgres");
    }
}
