use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::MetricsError;

use super::{AggregateStats, FailureKind, LatencyHistogram, RequestResult};

const DEFAULT_EXPECTED_STATUS: u16 = 200;
const DEFAULT_MAX_LATENCY: Duration = Duration::from_millis(500);

/// Per-request checks. A failed check is counted, it does not turn the
/// request into a failure on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPolicy {
    pub expected_status: u16,
    pub max_latency: Duration,
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            expected_status: DEFAULT_EXPECTED_STATUS,
            max_latency: DEFAULT_MAX_LATENCY,
        }
    }
}

impl CheckPolicy {
    /// Returns `(passed, failed)` for the status and latency checks.
    fn evaluate(&self, result: &RequestResult) -> (u64, u64) {
        let status_ok = result.status_code == self.expected_status;
        let latency_ok = result.duration < self.max_latency;
        let passed = u64::from(status_ok).saturating_add(u64::from(latency_ok));
        (passed, 2u64.saturating_sub(passed))
    }
}

struct CollectorState {
    started: Instant,
    request_count: u64,
    failure_count: u64,
    timeout_count: u64,
    transport_error_count: u64,
    unexpected_status_count: u64,
    dropped_iterations: u64,
    checks_passed: u64,
    checks_failed: u64,
    latency_sum_us: u128,
    min_latency: Duration,
    max_latency: Duration,
    histogram: LatencyHistogram,
    histogram_warned: bool,
}

impl CollectorState {
    fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            started: Instant::now(),
            request_count: 0,
            failure_count: 0,
            timeout_count: 0,
            transport_error_count: 0,
            unexpected_status_count: 0,
            dropped_iterations: 0,
            checks_passed: 0,
            checks_failed: 0,
            latency_sum_us: 0,
            min_latency: Duration::MAX,
            max_latency: Duration::ZERO,
            histogram: LatencyHistogram::new()?,
            histogram_warned: false,
        })
    }

    fn absorb(&mut self, other: &CollectorState) -> Result<(), MetricsError> {
        self.started = self.started.min(other.started);
        self.request_count = self.request_count.saturating_add(other.request_count);
        self.failure_count = self.failure_count.saturating_add(other.failure_count);
        self.timeout_count = self.timeout_count.saturating_add(other.timeout_count);
        self.transport_error_count = self
            .transport_error_count
            .saturating_add(other.transport_error_count);
        self.unexpected_status_count = self
            .unexpected_status_count
            .saturating_add(other.unexpected_status_count);
        self.dropped_iterations = self
            .dropped_iterations
            .saturating_add(other.dropped_iterations);
        self.checks_passed = self.checks_passed.saturating_add(other.checks_passed);
        self.checks_failed = self.checks_failed.saturating_add(other.checks_failed);
        self.latency_sum_us = self.latency_sum_us.saturating_add(other.latency_sum_us);
        self.min_latency = self.min_latency.min(other.min_latency);
        self.max_latency = self.max_latency.max(other.max_latency);
        self.histogram.merge(&other.histogram)
    }

    fn stats(&self, now: Instant) -> AggregateStats {
        let elapsed = now.saturating_duration_since(self.started);
        if self.request_count == 0 {
            let mut stats = AggregateStats::empty(elapsed);
            stats.dropped_iterations = self.dropped_iterations;
            return stats;
        }

        let mean_us = self
            .latency_sum_us
            .checked_div(u128::from(self.request_count))
            .unwrap_or(0);
        let mean_latency = Duration::from_micros(u64::try_from(mean_us).unwrap_or(u64::MAX));

        AggregateStats {
            elapsed,
            request_count: self.request_count,
            failure_count: self.failure_count,
            failure_rate: ratio(self.failure_count, self.request_count),
            timeout_count: self.timeout_count,
            transport_error_count: self.transport_error_count,
            unexpected_status_count: self.unexpected_status_count,
            dropped_iterations: self.dropped_iterations,
            checks_passed: self.checks_passed,
            checks_failed: self.checks_failed,
            min_latency: self.min_latency,
            mean_latency,
            max_latency: self.max_latency,
            percentiles: self.histogram.percentiles(),
            mean_throughput_rps: per_second(self.request_count, elapsed),
        }
    }
}

/// Thread-safe aggregation point shared by every worker of one scenario run.
pub struct MetricsCollector {
    policy: CheckPolicy,
    state: Mutex<CollectorState>,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl MetricsCollector {
    /// Creates an empty collector; the throughput clock starts now.
    ///
    /// # Errors
    ///
    /// Returns an error if the latency histogram cannot be allocated.
    pub fn new(policy: CheckPolicy) -> Result<Self, MetricsError> {
        Ok(Self {
            policy,
            state: Mutex::new(CollectorState::new()?),
        })
    }

    #[must_use]
    pub const fn policy(&self) -> CheckPolicy {
        self.policy
    }

    pub fn record(&self, result: &RequestResult) {
        let (passed, failed) = self.policy.evaluate(result);
        let latency_us = result.duration.as_micros();

        let mut state = self.lock();
        state.request_count = state.request_count.saturating_add(1);
        if let Some(kind) = result.failure {
            state.failure_count = state.failure_count.saturating_add(1);
            match kind {
                FailureKind::Timeout => {
                    state.timeout_count = state.timeout_count.saturating_add(1);
                }
                FailureKind::Transport => {
                    state.transport_error_count = state.transport_error_count.saturating_add(1);
                }
                FailureKind::UnexpectedStatus => {
                    state.unexpected_status_count = state.unexpected_status_count.saturating_add(1);
                }
            }
        }
        state.checks_passed = state.checks_passed.saturating_add(passed);
        state.checks_failed = state.checks_failed.saturating_add(failed);
        state.latency_sum_us = state.latency_sum_us.saturating_add(latency_us);
        state.min_latency = state.min_latency.min(result.duration);
        state.max_latency = state.max_latency.max(result.duration);
        if let Err(err) = state.histogram.record(result.duration)
            && !state.histogram_warned
        {
            warn!("Failed to record latency: {}", err);
            state.histogram_warned = true;
        }
    }

    /// Counts arrival-rate iterations that were not started because the
    /// worker pool was saturated.
    pub fn record_dropped(&self, count: u64) {
        let mut state = self.lock();
        state.dropped_iterations = state.dropped_iterations.saturating_add(count);
    }

    #[must_use]
    pub fn snapshot(&self) -> AggregateStats {
        self.lock().stats(Instant::now())
    }

    /// Clears every counter and the histogram, and restarts the throughput
    /// clock.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.started = Instant::now();
        state.request_count = 0;
        state.failure_count = 0;
        state.timeout_count = 0;
        state.transport_error_count = 0;
        state.unexpected_status_count = 0;
        state.dropped_iterations = 0;
        state.checks_passed = 0;
        state.checks_failed = 0;
        state.latency_sum_us = 0;
        state.min_latency = Duration::MAX;
        state.max_latency = Duration::ZERO;
        state.histogram.reset();
        state.histogram_warned = false;
    }

    /// Aggregates several collectors as if every result had been recorded
    /// into one. Elapsed time spans from the earliest start.
    ///
    /// # Errors
    ///
    /// Returns an error if the histograms cannot be merged.
    pub fn combined(collectors: &[Arc<MetricsCollector>]) -> Result<AggregateStats, MetricsError> {
        let mut total = CollectorState::new()?;
        for collector in collectors {
            total.absorb(&collector.lock())?;
        }
        Ok(total.stats(Instant::now()))
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "ratios are reported as floating point"
)]
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

#[expect(
    clippy::float_arithmetic,
    reason = "throughput is reported as floating point"
)]
fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    count as f64 / secs
}
