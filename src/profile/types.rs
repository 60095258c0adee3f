use std::time::Duration;

use crate::error::ProfileError;

/// A timed segment of a ramping profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u64,
}

impl Stage {
    #[must_use]
    pub const fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    /// A fixed number of workers for the whole duration.
    ConstantConcurrency { workers: u64, duration: Duration },
    /// Worker count ramps linearly between stage targets.
    RampingConcurrency { start_workers: u64, stages: Vec<Stage> },
    /// Iterations are started at a target rate per `time_unit`, executed by a
    /// bounded pool of at most `max_workers` concurrent workers.
    RampingArrivalRate {
        start_rate: u64,
        time_unit: Duration,
        pre_allocated_workers: usize,
        max_workers: usize,
        stages: Vec<Stage>,
    },
}

impl ProfileKind {
    #[must_use]
    pub const fn executor_name(&self) -> &'static str {
        match self {
            ProfileKind::ConstantConcurrency { .. } => "constant-vus",
            ProfileKind::RampingConcurrency { .. } => "ramping-vus",
            ProfileKind::RampingArrivalRate { .. } => "ramping-arrival-rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioProfile {
    name: String,
    kind: ProfileKind,
}

impl ScenarioProfile {
    /// Builds a validated profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] when the profile shape is contradictory (see
    /// [`ScenarioProfile::validate`]).
    pub fn new(name: impl Into<String>, kind: ProfileKind) -> Result<Self, ProfileError> {
        let profile = Self {
            name: name.into(),
            kind,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Checks stage durations, worker bounds and the arrival-rate time unit.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] for a zero duration, an empty stage list, a
    /// zero `time_unit`, a zero `max_workers`, or `pre_allocated_workers`
    /// exceeding `max_workers`.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        match &self.kind {
            ProfileKind::ConstantConcurrency { duration, .. } => {
                if duration.is_zero() {
                    return Err(ProfileError::ZeroDuration);
                }
            }
            ProfileKind::RampingConcurrency { stages, .. } => validate_stages(stages)?,
            ProfileKind::RampingArrivalRate {
                time_unit,
                pre_allocated_workers,
                max_workers,
                stages,
                ..
            } => {
                if time_unit.is_zero() {
                    return Err(ProfileError::ZeroTimeUnit {
                        time_unit: *time_unit,
                    });
                }
                if *max_workers == 0 {
                    return Err(ProfileError::ZeroMaxWorkers);
                }
                if pre_allocated_workers > max_workers {
                    return Err(ProfileError::PreAllocatedExceedsMax {
                        pre_allocated: *pre_allocated_workers,
                        max: *max_workers,
                    });
                }
                validate_stages(stages)?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &ProfileKind {
        &self.kind
    }

    #[must_use]
    pub const fn is_arrival_rate(&self) -> bool {
        matches!(self.kind, ProfileKind::RampingArrivalRate { .. })
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        match &self.kind {
            ProfileKind::ConstantConcurrency { duration, .. } => *duration,
            ProfileKind::RampingConcurrency { stages, .. }
            | ProfileKind::RampingArrivalRate { stages, .. } => stages
                .iter()
                .fold(Duration::ZERO, |total, stage| {
                    total.saturating_add(stage.duration)
                }),
        }
    }

    /// Returns the time unit rates are expressed in, `None` for concurrency
    /// profiles.
    #[must_use]
    pub const fn time_unit(&self) -> Option<Duration> {
        match &self.kind {
            ProfileKind::RampingArrivalRate { time_unit, .. } => Some(*time_unit),
            ProfileKind::ConstantConcurrency { .. } | ProfileKind::RampingConcurrency { .. } => {
                None
            }
        }
    }
}

fn validate_stages(stages: &[Stage]) -> Result<(), ProfileError> {
    if stages.is_empty() {
        return Err(ProfileError::MissingStages);
    }
    for (index, stage) in stages.iter().enumerate() {
        if stage.duration.is_zero() {
            return Err(ProfileError::ZeroStageDuration {
                index: index.saturating_add(1),
            });
        }
    }
    Ok(())
}
