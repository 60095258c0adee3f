use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::worker::{ActiveGuard, StopToken, WorkerContext, pause, run_iteration};

/// What an arrival-rate scenario does with an iteration when every worker is
/// busy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationPolicy {
    /// Skip the iteration and count it as dropped.
    #[default]
    Drop,
    /// Wait for a free worker. At most `maxVUs` iterations wait at once;
    /// beyond that they are dropped.
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DispatchOutcome {
    Started,
    Queued,
    Dropped,
}

/// Bounded executor for arrival-rate iterations. Starts with
/// `pre_allocated` worker permits and grows on demand up to `max_workers`.
pub(super) struct ArrivalPool {
    context: Arc<WorkerContext>,
    run_stop: watch::Receiver<bool>,
    permits: Arc<Semaphore>,
    allocated: usize,
    max_workers: usize,
    saturation: SaturationPolicy,
    queued: Arc<AtomicUsize>,
    pending: VecDeque<Instant>,
    dropped_since_report: u64,
    tasks: JoinSet<()>,
    active: Arc<AtomicU64>,
}

impl ArrivalPool {
    pub(super) fn new(
        context: Arc<WorkerContext>,
        run_stop: watch::Receiver<bool>,
        active: Arc<AtomicU64>,
        pre_allocated: usize,
        max_workers: usize,
        saturation: SaturationPolicy,
    ) -> Self {
        Self {
            context,
            run_stop,
            permits: Arc::new(Semaphore::new(pre_allocated)),
            allocated: pre_allocated,
            max_workers,
            saturation,
            queued: Arc::new(AtomicUsize::new(0)),
            pending: VecDeque::new(),
            dropped_since_report: 0,
            tasks: JoinSet::new(),
            active,
        }
    }

    /// Adds dispatch instants for the coming tick.
    pub(super) fn schedule(&mut self, instants: impl Iterator<Item = Instant>) {
        self.pending.extend(instants);
    }

    /// Earliest scheduled dispatch that has not fired yet.
    pub(super) fn next_dispatch(&self) -> Option<Instant> {
        self.pending.front().copied()
    }

    /// Fires every scheduled dispatch due at `now`.
    pub(super) fn dispatch_due(&mut self, now: Instant) {
        while let Some(at) = self.pending.front().copied() {
            if at > now {
                break;
            }
            self.pending.pop_front();
            self.dispatch();
        }
    }

    pub(super) fn dispatch(&mut self) -> DispatchOutcome {
        self.reap_finished();
        if let Some(permit) = self.try_acquire() {
            self.spawn_iteration(IterationStart::Ready(permit));
            return DispatchOutcome::Started;
        }
        match self.saturation {
            SaturationPolicy::Queue if self.queued.load(Ordering::Relaxed) < self.max_workers => {
                self.queued.fetch_add(1, Ordering::Relaxed);
                self.spawn_iteration(IterationStart::Queued);
                DispatchOutcome::Queued
            }
            SaturationPolicy::Queue | SaturationPolicy::Drop => {
                self.context.collector.record_dropped(1);
                self.dropped_since_report = self.dropped_since_report.saturating_add(1);
                DispatchOutcome::Dropped
            }
        }
    }

    /// Logs iterations dropped since the previous report, once.
    pub(super) fn report_dropped(&mut self) {
        if self.dropped_since_report > 0 {
            warn!(
                "Scenario '{}': dropped {} iterations, all {} workers busy.",
                self.context.scenario, self.dropped_since_report, self.allocated
            );
            self.dropped_since_report = 0;
        }
    }

    #[cfg(test)]
    pub(super) const fn allocated_workers(&self) -> usize {
        self.allocated
    }

    /// Abandons scheduled and queued dispatches, then waits for running
    /// iterations to finish.
    pub(super) async fn drain(&mut self) {
        let abandoned = u64::try_from(self.pending.len()).unwrap_or(u64::MAX);
        self.pending.clear();
        if abandoned > 0 {
            debug!(
                "Scenario '{}': {} scheduled iterations abandoned at drain.",
                self.context.scenario, abandoned
            );
        }
        self.permits.close();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                warn!("Iteration task failed: {}", err);
            }
        }
        self.report_dropped();
    }

    fn try_acquire(&mut self) -> Option<OwnedSemaphorePermit> {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(TryAcquireError::NoPermits) if self.allocated < self.max_workers => {
                self.permits.add_permits(1);
                self.allocated = self.allocated.saturating_add(1);
                debug!(
                    "Scenario '{}': allocated worker {} of {}.",
                    self.context.scenario, self.allocated, self.max_workers
                );
                Arc::clone(&self.permits).try_acquire_owned().ok()
            }
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => None,
        }
    }

    fn spawn_iteration(&mut self, start: IterationStart) {
        let context = Arc::clone(&self.context);
        let mut stop = StopToken::run_only(self.run_stop.clone());
        let permits = Arc::clone(&self.permits);
        let queued = Arc::clone(&self.queued);
        let active = Arc::clone(&self.active);

        self.tasks.spawn(async move {
            let permit = match start {
                IterationStart::Ready(permit) => permit,
                IterationStart::Queued => {
                    let acquired = permits.acquire_owned().await;
                    queued.fetch_sub(1, Ordering::Relaxed);
                    match acquired {
                        Ok(permit) => permit,
                        Err(_) => {
                            context.collector.record_dropped(1);
                            return;
                        }
                    }
                }
            };

            // A queued iteration may get its permit only after the run ended.
            if stop.is_stopped() {
                context.collector.record_dropped(1);
                return;
            }
            let _active = ActiveGuard::acquire(&active);
            run_iteration(&context, &mut stop).await;
            pause(context.think_time, &mut stop).await;
            drop(permit);
        });
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined {
                warn!("Iteration task failed: {}", err);
            }
        }
    }
}

enum IterationStart {
    Ready(OwnedSemaphorePermit),
    Queued,
}
