//! Metrics and observability utilities
//!
//! Prometheus metrics for retrieval, embedding and answer generation,
//! following one naming convention.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all LexDZ metrics
pub const METRICS_PREFIX: &str = "lexdz";

/// Histogram buckets for retrieval latency (in seconds)
///
/// Lexical retrieval over the corpus stays in the low milliseconds; the upper
/// buckets cover the query embedding round trip.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s, default embed timeout
    10.00,  // 10s
];

/// Buckets for provider latency (typically slower)
pub const PROVIDER_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

fn name(suffix: &str) -> String {
    format!("{}_{}", METRICS_PREFIX, suffix)
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(name("requests_total"), Unit::Count, "Total number of HTTP requests");
    describe_histogram!(
        name("request_duration_seconds"),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Retrieval metrics
    describe_counter!(
        name("retrieval_queries_total"),
        Unit::Count,
        "Total retrieval queries, by strategy that produced the result"
    );
    describe_histogram!(
        name("retrieval_duration_seconds"),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );
    describe_gauge!(
        name("retrieval_results_count"),
        Unit::Count,
        "Number of records returned by the last retrieval"
    );
    describe_counter!(
        name("retrieval_fallbacks_total"),
        Unit::Count,
        "Vector retrievals that fell back to lexical scoring"
    );

    // Embedding metrics
    describe_counter!(
        name("embedding_requests_total"),
        Unit::Count,
        "Total embedding API requests"
    );
    describe_histogram!(
        name("embedding_duration_seconds"),
        Unit::Seconds,
        "Embedding latency in seconds"
    );
    describe_counter!(
        name("embedding_errors_total"),
        Unit::Count,
        "Total embedding API errors"
    );

    // Generation metrics
    describe_counter!(
        name("generation_requests_total"),
        Unit::Count,
        "Total answer generation requests"
    );
    describe_histogram!(
        name("generation_duration_seconds"),
        Unit::Seconds,
        "Answer generation latency in seconds"
    );
    describe_counter!(
        name("generation_errors_total"),
        Unit::Count,
        "Total answer generation errors"
    );

    // Corpus
    describe_gauge!(name("corpus_records"), Unit::Count, "Records in the active snapshot");
    describe_gauge!(
        name("corpus_vectorized_records"),
        Unit::Count,
        "Records with an embedding in the active snapshot"
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
            name("requests_total"),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            name("request_duration_seconds"),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record retrieval metrics
pub fn record_retrieval(duration_secs: f64, strategy: &str, result_count: usize) {
    counter!(name("retrieval_queries_total"), "strategy" => strategy.to_string()).increment(1);

    histogram!(name("retrieval_duration_seconds"), "strategy" => strategy.to_string())
        .record(duration_secs);

    gauge!(name("retrieval_results_count"), "strategy" => strategy.to_string())
        .set(result_count as f64);
}

/// Count one vector-to-lexical fallback
pub fn record_fallback(reason: &str) {
    counter!(name("retrieval_fallbacks_total"), "reason" => reason.to_string()).increment(1);
}

/// Helper to record embedding metrics
pub fn record_embedding(duration_secs: f64, model: &str, batch_size: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        name("embedding_requests_total"),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(name("embedding_duration_seconds"), "model" => model.to_string())
            .record(duration_secs);
        tracing::trace!(model, batch_size, duration_secs, "Embedding recorded");
    } else {
        counter!(name("embedding_errors_total"), "model" => model.to_string()).increment(1);
    }
}

/// Helper to record answer generation metrics
pub fn record_generation(duration_secs: f64, provider: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        name("generation_requests_total"),
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(name("generation_duration_seconds"), "provider" => provider.to_string())
            .record(duration_secs);
    } else {
        counter!(name("generation_errors_total"), "provider" => provider.to_string()).increment(1);
    }
}

/// Publish the size of the active snapshot
pub fn record_corpus(records: usize, vectorized: usize) {
    gauge!(name("corpus_records")).set(records as f64);
    gauge!(name("corpus_vectorized_records")).set(vectorized as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, PROVIDER_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }

        // Default embed timeout sits on a bucket boundary
        assert!(LATENCY_BUCKETS.contains(&5.0));
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("POST", "/chat");
        metrics.finish(200);
        record_retrieval(0.002, "lexical", 3);
        record_fallback("embedding_error");
        record_embedding(0.3, "mock-embedding", 1, true);
        record_generation(1.2, "mock", false);
        record_corpus(10, 4);
    }
}
