use lazy_static::lazy_static;
use prometheus::{
    opts, register_counter, register_gauge, register_histogram, Counter, Encoder, Gauge,
    Histogram, TextEncoder,
};

lazy_static! {
    /// Total keys successfully recorded (across all epochs).
    pub static ref RECORDS_TOTAL: Counter = register_counter!(opts!(
        "tracker_records_total",
        "Total keys recorded"
    ))
    .unwrap();

    /// Records rejected because the key was empty.
    pub static ref INVALID_KEYS_TOTAL: Counter = register_counter!(opts!(
        "tracker_invalid_keys_total",
        "Total records rejected for an invalid key"
    ))
    .unwrap();

    /// Epoch resets performed.
    pub static ref RESETS_TOTAL: Counter = register_counter!(opts!(
        "tracker_resets_total",
        "Total epoch resets"
    ))
    .unwrap();

    /// Distinct keys observed in the current epoch.
    pub static ref DISTINCT_KEYS: Gauge = register_gauge!(opts!(
        "tracker_distinct_keys",
        "Distinct keys observed in the current epoch"
    ))
    .unwrap();

    /// Snapshot latency in milliseconds, lock acquisition through ranking.
    ///
    /// Buckets are dense below 1ms since a snapshot only touches K entries.
    pub static ref SNAPSHOT_LATENCY_MS: Histogram = register_histogram!(
        "tracker_snapshot_latency_ms",
        "Top-K snapshot latency in ms",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 50.0, 300.0]
    )
    .unwrap();

    /// Records dropped by `try_record` because the queue was full.
    pub static ref QUEUE_DROPPED_TOTAL: Counter = register_counter!(opts!(
        "tracker_queue_dropped_total",
        "Total records dropped due to record queue back-pressure"
    ))
    .unwrap();
}

/// Render the default registry in the Prometheus text exposition format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
