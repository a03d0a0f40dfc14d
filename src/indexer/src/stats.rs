use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `(values, rate, mean)` from spec §4.2, updated after each ingest batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub values: u64,
    pub rate: f64,
    pub mean: f64,
}

/// Tracks [`Stats`] across batches: `rate` is events/sec for the most
/// recent batch, `mean` is the running mean of that per-batch rate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatsTracker {
    stats: Stats,
    batches: u64,
}

impl StatsTracker {
    pub fn record(&mut self, count: u64, elapsed: Duration) {
        self.stats.values += count;
        let secs = elapsed.as_secs_f64();
        self.stats.rate = if secs > 0.0 { count as f64 / secs } else { count as f64 };
        self.batches += 1;
        self.stats.mean += (self.stats.rate - self.stats.mean) / (self.batches as f64);
    }

    pub fn get(&self) -> Stats {
        self.stats
    }
}
