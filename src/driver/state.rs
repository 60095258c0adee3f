use std::fmt;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

/// Lifecycle of one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    /// Workers were told to stop and in-flight requests are finishing.
    Draining,
    Completed,
}

impl DriverState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DriverState::Idle => "idle",
            DriverState::Running => "running",
            DriverState::Draining => "draining",
            DriverState::Completed => "completed",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishes state transitions on a `watch` channel and logs them.
#[derive(Debug)]
pub(super) struct StateTracker {
    scenario: String,
    sender: watch::Sender<DriverState>,
}

impl StateTracker {
    pub(super) fn new(scenario: &str) -> Self {
        let (sender, _) = watch::channel(DriverState::Idle);
        Self {
            scenario: scenario.to_owned(),
            sender,
        }
    }

    pub(super) fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.sender.subscribe()
    }

    pub(super) fn current(&self) -> DriverState {
        *self.sender.borrow()
    }

    pub(super) fn transition(&self, next: DriverState) {
        let previous = self.sender.send_replace(next);
        if previous != next {
            info!("Scenario '{}': {} -> {}", self.scenario, previous, next);
        }
    }
}

/// Scheduler-side bookkeeping for one concurrency worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct WorkerState {
    pub(super) id: u64,
    pub(super) current_stage_index: Option<usize>,
    /// When the scheduler revisits this worker next.
    pub(super) next_scheduled_time: Instant,
}
