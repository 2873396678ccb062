//! Provider metrics.
//!
//! Counters are recorded through the `metrics` facade; nothing is exported
//! unless the host process installs a recorder.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total provider requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "cine_provider_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "cine_provider_retries_total";
}

/// Record a completed provider request.
pub fn record_request(model: &str, status: u16) {
    counter!(
        names::REQUESTS_TOTAL,
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("gemini-2.5-flash-image", 200);
        record_retry("frame_image");
    }
}
