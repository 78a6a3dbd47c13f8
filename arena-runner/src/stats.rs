use hdrhistogram::errors::CreationError;
use hdrhistogram::Histogram;
use log::info;
use std::time::Duration;

/// Longest tick we expect to record, in microseconds.
const MAX_TRACKED_MICROS: u64 = 60_000_000;

/// Distribution of wall-clock tick durations.
pub struct TickStats {
    histogram: Histogram<u64>,
    overruns: u64,
}

impl TickStats {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            histogram: Histogram::new_with_bounds(1, MAX_TRACKED_MICROS, 3)?,
            overruns: 0,
        })
    }

    /// Record one tick. Unpaced runs have no budget and never overrun.
    pub fn record(&mut self, elapsed: Duration, budget: Option<Duration>) {
        let micros = (elapsed.as_micros() as u64).clamp(1, MAX_TRACKED_MICROS);
        self.histogram.saturating_record(micros);
        if budget.is_some_and(|budget| elapsed > budget) {
            self.overruns += 1;
        }
    }

    pub fn samples(&self) -> u64 {
        self.histogram.len()
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn percentile_micros(&self, percentile: f64) -> u64 {
        self.histogram.value_at_percentile(percentile)
    }

    pub fn log_summary(&self) {
        if self.samples() == 0 {
            info!("No ticks were run.");
            return;
        }
        info!(
            "Tick durations over {} ticks: p50 {}us, p99 {}us, max {}us, mean {:.1}us, {} over budget",
            self.samples(),
            self.percentile_micros(50.0),
            self.percentile_micros(99.0),
            self.histogram.max(),
            self.histogram.mean(),
            self.overruns,
        );
    }
}
