use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::state::WorkerState;
use super::worker::{StopToken, WorkerContext, worker_loop};

/// A visit later than this past its scheduled time is logged.
const LATE_VISIT_THRESHOLD: Duration = Duration::from_millis(250);

struct WorkerSlot {
    state: WorkerState,
    stop: watch::Sender<bool>,
}

/// Long-lived workers whose count follows the profile curve.
pub(super) struct ConcurrencyPool {
    context: Arc<WorkerContext>,
    run_stop: watch::Receiver<bool>,
    slots: Vec<WorkerSlot>,
    next_id: u64,
    tasks: JoinSet<()>,
    active: Arc<AtomicU64>,
}

impl ConcurrencyPool {
    pub(super) fn new(
        context: Arc<WorkerContext>,
        run_stop: watch::Receiver<bool>,
        active: Arc<AtomicU64>,
    ) -> Self {
        Self {
            context,
            run_stop,
            slots: Vec::new(),
            next_id: 0,
            tasks: JoinSet::new(),
            active,
        }
    }

    /// Spawns workers or stops the newest ones until `target` are active.
    /// Stopped workers finish their in-flight request before exiting.
    pub(super) fn scale_to(
        &mut self,
        target: u64,
        stage_index: Option<usize>,
        visited_at: Instant,
        next_visit: Instant,
    ) {
        self.reap_finished();
        if let Some(slot) = self.slots.first() {
            let lag = visited_at.saturating_duration_since(slot.state.next_scheduled_time);
            if lag >= LATE_VISIT_THRESHOLD {
                debug!(
                    "Scenario '{}': scheduler visit {:?} late.",
                    self.context.scenario, lag
                );
            }
        }
        let target = usize::try_from(target).unwrap_or(usize::MAX);
        let current = self.slots.len();

        if current < target {
            for _ in current..target {
                self.spawn_worker(stage_index, next_visit);
            }
            debug!(
                "Scenario '{}': scaled up {} -> {} workers.",
                self.context.scenario, current, target
            );
        } else if current > target {
            let excess = self.slots.split_off(target);
            for slot in excess.iter().rev() {
                slot.stop.send_replace(true);
            }
            debug!(
                "Scenario '{}': scaled down {} -> {} workers.",
                self.context.scenario, current, target
            );
        }

        for slot in &mut self.slots {
            if slot.state.current_stage_index != stage_index {
                debug!(
                    "Scenario '{}': worker {} entering stage {:?}.",
                    self.context.scenario, slot.state.id, stage_index
                );
            }
            slot.state.current_stage_index = stage_index;
            slot.state.next_scheduled_time = next_visit;
        }
        self.active.store(
            u64::try_from(self.slots.len()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    /// Ids of the workers currently kept active, oldest first.
    #[cfg(test)]
    pub(super) fn worker_ids(&self) -> Vec<u64> {
        self.slots.iter().map(|slot| slot.state.id).collect()
    }

    /// Signals every worker and waits for all of them to exit.
    pub(super) async fn drain(&mut self) {
        for slot in self.slots.drain(..) {
            slot.stop.send_replace(true);
        }
        self.active.store(0, Ordering::Relaxed);
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                warn!("Worker task failed: {}", err);
            }
        }
    }

    fn spawn_worker(&mut self, stage_index: Option<usize>, next_visit: Instant) {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        let (stop, own) = watch::channel(false);
        let token = StopToken::new(own, self.run_stop.clone());
        self.tasks
            .spawn(worker_loop(Arc::clone(&self.context), id, token));
        self.slots.push(WorkerSlot {
            state: WorkerState {
                id,
                current_stage_index: stage_index,
                next_scheduled_time: next_visit,
            },
            stop,
        });
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined {
                warn!("Worker task failed: {}", err);
            }
        }
    }
}
