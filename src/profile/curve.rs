use std::time::Duration;

use super::types::{ProfileKind, ScenarioProfile, Stage};

/// Smallest sampling step accepted by [`ScenarioProfile::samples`].
const MIN_GRANULARITY: Duration = Duration::from_millis(1);

impl ScenarioProfile {
    /// Desired worker count (concurrency profiles) or iterations per time
    /// unit (arrival-rate profiles) at `elapsed`.
    ///
    /// Constant profiles are a step function; ramping profiles interpolate
    /// linearly from the previous stage's target (or the start value) to the
    /// current stage's target. The value at exactly the end of the timeline is
    /// the last target; anything past the end is `0`.
    #[must_use]
    pub fn target_at(&self, elapsed: Duration) -> u64 {
        match self.kind() {
            ProfileKind::ConstantConcurrency { workers, duration } => {
                if elapsed <= *duration {
                    *workers
                } else {
                    0
                }
            }
            ProfileKind::RampingConcurrency {
                start_workers,
                stages,
            } => ramp_value(*start_workers, stages, elapsed),
            ProfileKind::RampingArrivalRate {
                start_rate, stages, ..
            } => ramp_value(*start_rate, stages, elapsed),
        }
    }

    /// Index of the stage active at `elapsed`. Constant profiles report a
    /// single stage `0`; `None` once the timeline is over.
    #[must_use]
    pub fn stage_index_at(&self, elapsed: Duration) -> Option<usize> {
        match self.kind() {
            ProfileKind::ConstantConcurrency { duration, .. } => {
                (elapsed <= *duration).then_some(0)
            }
            ProfileKind::RampingConcurrency { stages, .. }
            | ProfileKind::RampingArrivalRate { stages, .. } => {
                let mut stage_start = Duration::ZERO;
                let last = stages.len().checked_sub(1)?;
                for (index, stage) in stages.iter().enumerate() {
                    let stage_end = stage_start.saturating_add(stage.duration);
                    if elapsed < stage_end || (index == last && elapsed == stage_end) {
                        return Some(index);
                    }
                    stage_start = stage_end;
                }
                None
            }
        }
    }

    /// Lazily walks the curve from `0` to the total duration in steps of
    /// `granularity`, always ending with a sample at the total duration.
    #[must_use]
    pub fn samples(&self, granularity: Duration) -> ProfileSamples<'_> {
        ProfileSamples {
            profile: self,
            granularity: granularity.max(MIN_GRANULARITY),
            total: self.total_duration(),
            next: Some(Duration::ZERO),
        }
    }
}

/// Finite iterator of `(elapsed, target)` pairs over a profile's timeline.
#[derive(Debug, Clone)]
pub struct ProfileSamples<'profile> {
    profile: &'profile ScenarioProfile,
    granularity: Duration,
    total: Duration,
    next: Option<Duration>,
}

impl Iterator for ProfileSamples<'_> {
    type Item = (Duration, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let elapsed = self.next?;
        self.next = if elapsed >= self.total {
            None
        } else {
            Some(elapsed.saturating_add(self.granularity).min(self.total))
        };
        Some((elapsed, self.profile.target_at(elapsed)))
    }
}

fn ramp_value(start: u64, stages: &[Stage], elapsed: Duration) -> u64 {
    let mut stage_start_at = Duration::ZERO;
    let mut stage_start_value = start;
    for stage in stages {
        let stage_end_at = stage_start_at.saturating_add(stage.duration);
        if elapsed < stage_end_at {
            let into_stage = elapsed.saturating_sub(stage_start_at);
            return interpolate(stage_start_value, stage.target, into_stage, stage.duration);
        }
        stage_start_at = stage_end_at;
        stage_start_value = stage.target;
    }
    if elapsed == stage_start_at {
        stage_start_value
    } else {
        0
    }
}

fn interpolate(start: u64, target: u64, elapsed: Duration, span: Duration) -> u64 {
    let span_ms = i128::try_from(span.as_millis()).unwrap_or(i128::MAX).max(1);
    let elapsed_ms = i128::try_from(elapsed.as_millis())
        .unwrap_or(i128::MAX)
        .min(span_ms);

    let start = i128::from(start);
    let delta = i128::from(target).saturating_sub(start);
    let step = delta
        .saturating_mul(elapsed_ms)
        .checked_div(span_ms)
        .unwrap_or(0);
    let value = start.saturating_add(step);
    if value < 0 {
        0
    } else {
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}
