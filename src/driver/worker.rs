use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use crate::http::{RequestExecutor, RequestSpec};
use crate::metrics::{
    MetricsCollector, RequestLog, RequestResult, TELEMETRY_EVENT_TYPE, TelemetryRecord,
};

/// Everything a worker needs to run the request sequence, shared by every
/// worker of one scenario.
pub(super) struct WorkerContext {
    pub(super) scenario: String,
    pub(super) requests: Arc<[RequestSpec]>,
    pub(super) base_url: Url,
    pub(super) executor: Arc<dyn RequestExecutor>,
    pub(super) collector: Arc<MetricsCollector>,
    pub(super) request_log: RequestLog,
    pub(super) think_time: Duration,
}

impl WorkerContext {
    fn record(&self, spec: &RequestSpec, result: &RequestResult) {
        self.collector.record(result);
        self.request_log.emit(&TelemetryRecord {
            event_type: TELEMETRY_EVENT_TYPE,
            scenario: &self.scenario,
            label: &result.label,
            endpoint: &result.endpoint,
            request_data: spec.request_data(),
            response_body: &result.body,
            status_code: result.status_code,
            duration_ms: result.duration_millis(),
            timestamp: result.timestamp_ms,
            error: result.error.as_deref(),
        });
    }
}

/// Stop signal observed by a worker: its own token (scale-down) or the
/// run-wide one (scenario end, shutdown).
#[derive(Debug, Clone)]
pub(super) struct StopToken {
    own: watch::Receiver<bool>,
    run: watch::Receiver<bool>,
}

impl StopToken {
    pub(super) const fn new(own: watch::Receiver<bool>, run: watch::Receiver<bool>) -> Self {
        Self { own, run }
    }

    /// A token that only follows the run-wide signal.
    pub(super) fn run_only(run: watch::Receiver<bool>) -> Self {
        Self {
            own: run.clone(),
            run,
        }
    }

    pub(super) fn is_stopped(&self) -> bool {
        *self.own.borrow() || *self.run.borrow()
    }

    /// Resolves once either signal is raised or its sender is gone.
    async fn stopped(&mut self) {
        while !self.is_stopped() {
            let changed = tokio::select! {
                changed = self.own.changed() => changed,
                changed = self.run.changed() => changed,
            };
            if changed.is_err() {
                return;
            }
        }
    }
}

/// Runs the whole request sequence once. A stop raised meanwhile only
/// shortens per-request think time; the remaining requests are still sent so
/// no partial iteration is recorded.
pub(super) async fn run_iteration(context: &WorkerContext, stop: &mut StopToken) {
    for spec in context.requests.iter() {
        let result = context.executor.execute(spec, &context.base_url).await;
        context.record(spec, &result);

        if let Some(think_time) = spec.think_time {
            pause(think_time, stop).await;
        }
    }
}

/// Sleeps for `duration` unless stopped first. Returns `false` when stopped.
pub(super) async fn pause(duration: Duration, stop: &mut StopToken) -> bool {
    if duration.is_zero() {
        tokio::task::yield_now().await;
        return !stop.is_stopped();
    }
    tokio::select! {
        () = sleep(duration) => !stop.is_stopped(),
        () = stop.stopped() => false,
    }
}

/// Body of a concurrency worker: iterations separated by think time. The
/// stop token is only checked before a new iteration starts.
pub(super) async fn worker_loop(context: Arc<WorkerContext>, id: u64, mut stop: StopToken) {
    debug!("Worker {} started for scenario '{}'.", id, context.scenario);
    let mut iterations: u64 = 0;
    while !stop.is_stopped() {
        run_iteration(&context, &mut stop).await;
        iterations = iterations.saturating_add(1);
        if !pause(context.think_time, &mut stop).await {
            break;
        }
    }
    debug!("Worker {} stopped after {} iterations.", id, iterations);
}

/// Counts an arrival-rate iteration as active while held.
pub(super) struct ActiveGuard {
    counter: Arc<AtomicU64>,
}

impl ActiveGuard {
    pub(super) fn acquire(counter: &Arc<AtomicU64>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        loop {
            let current = self.counter.load(Ordering::Relaxed);
            let Some(next) = current.checked_sub(1) else {
                break;
            };
            if self
                .counter
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }
}
