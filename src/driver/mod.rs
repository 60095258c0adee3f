//! Runs a [`ScenarioProfile`] as concurrent executions of the request
//! sequence and feeds every result into a [`MetricsCollector`].
mod arrival;
mod concurrency;
mod rate;
mod state;
mod worker;


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::info;
use url::Url;

use crate::http::{RequestExecutor, RequestSpec};
use crate::metrics::{AggregateStats, MetricsCollector, RequestLog};
use crate::profile::{ProfileKind, ScenarioProfile};
use crate::shutdown::ShutdownReceiver;

use arrival::ArrivalPool;
use concurrency::ConcurrencyPool;
use rate::{ArrivalPacer, spread_offsets};
use worker::WorkerContext;

pub use arrival::SaturationPolicy;
pub use state::DriverState;

const DEFAULT_TICK: Duration = Duration::from_secs(1);
const DEFAULT_THINK_TIME: Duration = Duration::from_secs(1);
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Scheduler knobs shared by every scenario of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// How often the profile curve is sampled.
    pub tick: Duration,
    /// Pause between two iterations of one worker.
    pub think_time: Duration,
    pub saturation: SaturationPolicy,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            think_time: DEFAULT_THINK_TIME,
            saturation: SaturationPolicy::Drop,
        }
    }
}

/// Where requests go and where their results end up.
#[derive(Clone)]
pub struct DriverContext {
    pub base_url: Url,
    pub executor: Arc<dyn RequestExecutor>,
    pub collector: Arc<MetricsCollector>,
    pub request_log: RequestLog,
}

/// One scenario run. Build it, subscribe to its state if needed, then
/// consume it with [`LoadDriver::run`].
pub struct LoadDriver {
    profile: ScenarioProfile,
    requests: Arc<[RequestSpec]>,
    context: DriverContext,
    settings: DriverSettings,
    state: state::StateTracker,
    active_workers: Arc<AtomicU64>,
}

impl std::fmt::Debug for LoadDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadDriver")
            .field("profile", &self.profile)
            .field("requests", &self.requests.len())
            .field("settings", &self.settings)
            .field("state", &self.state.current())
            .finish_non_exhaustive()
    }
}

/// Handle for observing a driver while [`LoadDriver::run`] owns it.
#[derive(Debug, Clone)]
pub struct DriverMonitor {
    state: watch::Receiver<DriverState>,
    active_workers: Arc<AtomicU64>,
}

impl DriverMonitor {
    #[must_use]
    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    /// Workers kept active by the scheduler (concurrency profiles) or
    /// iterations in flight (arrival-rate profiles).
    #[must_use]
    pub fn active_workers(&self) -> u64 {
        self.active_workers.load(Ordering::Relaxed)
    }

    /// Waits until the driver reaches `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver was dropped before reaching `target`.
    pub async fn wait_for(&mut self, target: DriverState) -> Result<(), watch::error::RecvError> {
        self.state.wait_for(|state| *state == target).await.map(drop)
    }
}

enum Pool {
    Concurrency(ConcurrencyPool),
    Arrival {
        pool: ArrivalPool,
        pacer: ArrivalPacer,
    },
}

impl LoadDriver {
    #[must_use]
    pub fn new(
        profile: ScenarioProfile,
        requests: Arc<[RequestSpec]>,
        context: DriverContext,
        settings: DriverSettings,
    ) -> Self {
        let state = state::StateTracker::new(profile.name());
        Self {
            profile,
            requests,
            context,
            settings,
            state,
            active_workers: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub const fn profile(&self) -> &ScenarioProfile {
        &self.profile
    }

    #[must_use]
    pub fn monitor(&self) -> DriverMonitor {
        DriverMonitor {
            state: self.state.subscribe(),
            active_workers: Arc::clone(&self.active_workers),
        }
    }

    /// Runs the scenario for its total duration, or until `shutdown` fires,
    /// then drains in-flight requests and returns the final statistics.
    pub async fn run(self, mut shutdown: ShutdownReceiver) -> AggregateStats {
        let total = self.profile.total_duration();
        let tick = self.settings.tick.max(Duration::from_millis(1));
        info!(
            "Scenario '{}' ({}) starting for {:?} with {} requests per iteration.",
            self.profile.name(),
            self.profile.kind().executor_name(),
            total,
            self.requests.len()
        );

        let (run_stop_tx, run_stop_rx) = watch::channel(false);
        let worker_context = Arc::new(WorkerContext {
            scenario: self.profile.name().to_owned(),
            requests: Arc::clone(&self.requests),
            base_url: self.context.base_url.clone(),
            executor: Arc::clone(&self.context.executor),
            collector: Arc::clone(&self.context.collector),
            request_log: self.context.request_log.clone(),
            think_time: self.settings.think_time,
        });
        let mut pool = self.build_pool(worker_context, run_stop_rx, tick);

        self.state.transition(DriverState::Running);
        let start = Instant::now();
        let deadline = offset(start, total);
        let mut next_progress = offset(start, PROGRESS_INTERVAL);
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let next_dispatch = match &pool {
                Pool::Arrival { pool: arrival, .. } => arrival.next_dispatch(),
                Pool::Concurrency(_) => None,
            };
            tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown requested, draining scenario '{}'.", self.profile.name());
                    break;
                }
                () = sleep_until(deadline) => break,
                () = sleep_until(next_dispatch.unwrap_or(deadline)), if next_dispatch.is_some() => {
                    if let Pool::Arrival { pool: arrival, .. } = &mut pool {
                        arrival.dispatch_due(Instant::now());
                    }
                }
                tick_at = ticker.tick() => {
                    let elapsed = tick_at.saturating_duration_since(start);
                    self.on_tick(&mut pool, elapsed, tick_at, tick);
                    if tick_at >= next_progress {
                        self.log_progress(elapsed);
                        next_progress = offset(next_progress, PROGRESS_INTERVAL);
                    }
                }
            }
        }

        self.state.transition(DriverState::Draining);
        run_stop_tx.send_replace(true);
        match &mut pool {
            Pool::Concurrency(concurrency) => concurrency.drain().await,
            Pool::Arrival { pool: arrival, .. } => arrival.drain().await,
        }
        self.active_workers.store(0, Ordering::Relaxed);

        let stats = self.context.collector.snapshot();
        self.state.transition(DriverState::Completed);
        info!(
            "Scenario '{}' completed: {} requests, {} failures.",
            self.profile.name(),
            stats.request_count,
            stats.failure_count
        );
        stats
    }

    fn build_pool(
        &self,
        context: Arc<WorkerContext>,
        run_stop: watch::Receiver<bool>,
        tick: Duration,
    ) -> Pool {
        let active = Arc::clone(&self.active_workers);
        match self.profile.kind() {
            ProfileKind::ConstantConcurrency { .. } | ProfileKind::RampingConcurrency { .. } => {
                Pool::Concurrency(ConcurrencyPool::new(context, run_stop, active))
            }
            ProfileKind::RampingArrivalRate {
                time_unit,
                pre_allocated_workers,
                max_workers,
                ..
            } => Pool::Arrival {
                pool: ArrivalPool::new(
                    context,
                    run_stop,
                    active,
                    *pre_allocated_workers,
                    *max_workers,
                    self.settings.saturation,
                ),
                pacer: ArrivalPacer::new(tick, *time_unit),
            },
        }
    }

    fn on_tick(&self, pool: &mut Pool, elapsed: Duration, tick_at: Instant, tick: Duration) {
        let target = self.profile.target_at(elapsed);
        match pool {
            Pool::Concurrency(pool) => {
                let stage_index = self.profile.stage_index_at(elapsed);
                pool.scale_to(target, stage_index, tick_at, offset(tick_at, tick));
            }
            Pool::Arrival { pool, pacer } => {
                pool.report_dropped();
                let count = pacer.iterations_for(target);
                pool.schedule(spread_offsets(count, tick).map(|delay| offset(tick_at, delay)));
                pool.dispatch_due(Instant::now());
            }
        }
    }

    fn log_progress(&self, elapsed: Duration) {
        let stats = self.context.collector.snapshot();
        info!(
            "Scenario '{}' at {}s: {} active, {} requests, {} failures, {:.1} req/s.",
            self.profile.name(),
            elapsed.as_secs(),
            self.active_workers.load(Ordering::Relaxed),
            stats.request_count,
            stats.failure_count,
            stats.mean_throughput_rps
        );
    }
}

fn offset(instant: Instant, by: Duration) -> Instant {
    instant.checked_add(by).unwrap_or(instant)
}

/// Resolves on a shutdown signal; a closed channel never resolves.
async fn shutdown_requested(shutdown: &mut ShutdownReceiver) {
    match shutdown.recv().await {
        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
    }
}
