use std::time::Duration;

use serde::Serialize;

use super::Percentiles;

/// Status recorded when no HTTP response was received (timeout, refused
/// connection, body read failure).
pub const STATUS_NO_RESPONSE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    UnexpectedStatus,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
            FailureKind::UnexpectedStatus => "unexpected_status",
        }
    }
}

/// Outcome of one executed request.
#[derive(Debug, Clone)]
pub struct RequestResult {
    pub label: String,
    pub endpoint: String,
    pub status_code: u16,
    pub duration: Duration,
    pub body_bytes: u64,
    /// Leading part of the response body, kept for the telemetry log.
    pub body: String,
    /// Milliseconds since the Unix epoch at dispatch.
    pub timestamp_ms: i64,
    pub failure: Option<FailureKind>,
    /// Transport error text when the request never produced a response.
    pub error: Option<String>,
}

impl RequestResult {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    #[must_use]
    pub fn duration_millis(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Statistics derived from every result recorded since the collector was
/// created or last reset.
///
/// `failure_rate` is `failure_count / request_count`, and `0.0` when no
/// request has been recorded. Latency fields are `Duration::ZERO` in that
/// case.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStats {
    pub elapsed: Duration,
    pub request_count: u64,
    pub failure_count: u64,
    pub failure_rate: f64,
    pub timeout_count: u64,
    pub transport_error_count: u64,
    pub unexpected_status_count: u64,
    pub dropped_iterations: u64,
    pub checks_passed: u64,
    pub checks_failed: u64,
    pub min_latency: Duration,
    pub mean_latency: Duration,
    pub max_latency: Duration,
    pub percentiles: Percentiles,
    pub mean_throughput_rps: f64,
}

impl AggregateStats {
    #[must_use]
    pub fn empty(elapsed: Duration) -> Self {
        Self {
            elapsed,
            request_count: 0,
            failure_count: 0,
            failure_rate: 0.0,
            timeout_count: 0,
            transport_error_count: 0,
            unexpected_status_count: 0,
            dropped_iterations: 0,
            checks_passed: 0,
            checks_failed: 0,
            min_latency: Duration::ZERO,
            mean_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            percentiles: Percentiles::default(),
            mean_throughput_rps: 0.0,
        }
    }

    #[must_use]
    pub const fn success_count(&self) -> u64 {
        self.request_count.saturating_sub(self.failure_count)
    }
}
