use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Significant figures kept by the histogram; bounds relative error to 0.1%.
const SIGNIFICANT_FIGURES: u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Percentiles {
    pub p50: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

/// Latency distribution in microseconds. Memory grows with the logarithm of
/// the largest recorded value, not with the number of records.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist =
            Histogram::<u64>::new(SIGNIFICANT_FIGURES).map_err(|err| MetricsError::Histogram {
                context: "create",
                source: Box::new(err),
            })?;
        Ok(Self { hist })
    }

    /// Record one latency.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency: Duration) -> Result<(), MetricsError> {
        let micros = u64::try_from(latency.as_micros())
            .unwrap_or(u64::MAX)
            .max(1);
        self.hist
            .record(micros)
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    /// Merge another histogram into this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge fails.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<(), MetricsError> {
        self.hist
            .add(&other.hist)
            .map_err(|err| MetricsError::Histogram {
                context: "merge",
                source: Box::new(err),
            })
    }

    pub fn reset(&mut self) {
        self.hist.reset();
    }

    #[must_use]
    pub fn percentiles(&self) -> Percentiles {
        if self.count() == 0 {
            return Percentiles::default();
        }

        Percentiles {
            p50: self.value_at(0.50),
            p90: self.value_at(0.90),
            p95: self.value_at(0.95),
            p99: self.value_at(0.99),
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    fn value_at(&self, quantile: f64) -> Duration {
        Duration::from_micros(self.hist.value_at_quantile(quantile))
    }
}
