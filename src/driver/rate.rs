use std::time::Duration;

/// Converts an arrival rate (iterations per time unit) into a whole number of
/// iterations per scheduler tick, carrying the fractional remainder forward
/// so long-run totals match the rate exactly.
#[derive(Debug, Clone)]
pub(super) struct ArrivalPacer {
    tick_ms: u64,
    unit_ms: u64,
    remainder: u64,
}

impl ArrivalPacer {
    pub(super) fn new(tick: Duration, time_unit: Duration) -> Self {
        Self {
            tick_ms: millis(tick),
            unit_ms: millis(time_unit),
            remainder: 0,
        }
    }

    /// Iterations to start during the next tick at `rate` per time unit.
    pub(super) fn iterations_for(&mut self, rate: u64) -> u64 {
        let scaled = rate.saturating_mul(self.tick_ms);
        let (base, rem) = div_mod_u64(scaled, self.unit_ms);
        let (carry, new_rem) = div_mod_u64(self.remainder.saturating_add(rem), self.unit_ms);
        self.remainder = new_rem;
        base.saturating_add(carry)
    }
}

/// Offsets from the tick start that spread `count` dispatches evenly across
/// `tick`; the first one fires at the tick start.
pub(super) fn spread_offsets(count: u64, tick: Duration) -> impl Iterator<Item = Duration> {
    let tick_nanos = tick.as_nanos();
    let count_wide = u128::from(count);
    (0..count).map(move |index| {
        let nanos = tick_nanos
            .saturating_mul(u128::from(index))
            .checked_div(count_wide)
            .unwrap_or(0);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn div_mod_u64(value: u64, divisor: u64) -> (u64, u64) {
    if divisor == 0 {
        return (0, 0);
    }
    let div = value.checked_div(divisor).unwrap_or(0);
    let rem = value.checked_rem(divisor).unwrap_or(0);
    (div, rem)
}
