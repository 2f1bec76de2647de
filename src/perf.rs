//! Per-operation wall-clock timing for the driver loop.
//!
//! Each named operation accumulates call count, total, min and max
//! duration. Operations are reported in name order.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use crate::types::TelemetryError;

/// Accumulated timings of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpStats {
    pub calls: u64,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl OpStats {
    fn new(elapsed: Duration) -> Self {
        Self {
            calls: 1,
            total: elapsed,
            min: elapsed,
            max: elapsed,
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.calls += 1;
        self.total += elapsed;
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
    }

    /// Mean duration per call
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((self.total.as_nanos() / u128::from(self.calls)) as u64)
    }
}

/// Timing table keyed by operation name
#[derive(Debug, Clone, Default)]
pub struct PerfMonitor {
    ops: BTreeMap<String, OpStats>,
}

impl PerfMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, charging its duration to `name`
    pub fn time<T, F: FnOnce() -> T>(&mut self, name: &str, f: F) -> T {
        let start = Instant::now();
        let out = f();
        self.record(name, start.elapsed());
        out
    }

    /// Charge an externally measured duration to `name`
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        match self.ops.get_mut(name) {
            Some(stats) => stats.record(elapsed),
            None => {
                self.ops.insert(name.to_string(), OpStats::new(elapsed));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&OpStats> {
        self.ops.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Log one line per operation
    pub fn summary(&self) {
        for (name, stats) in &self.ops {
            info!(
                operation = %name,
                calls = stats.calls,
                total_ms = millis(stats.total),
                avg_ms = millis(stats.average()),
                min_ms = millis(stats.min),
                max_ms = millis(stats.max),
                "perf"
            );
        }
    }

    /// Write the table as CSV to a file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TelemetryError> {
        let file = std::fs::File::create(path)?;
        self.write_csv_to(file)
    }

    /// Write the table as CSV:
    /// `operation,calls,total_ms,avg_ms,min_ms,max_ms`
    pub fn write_csv_to<W: io::Write>(&self, out: W) -> Result<(), TelemetryError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["operation", "calls", "total_ms", "avg_ms", "min_ms", "max_ms"])?;

        for (name, stats) in &self.ops {
            writer.write_record([
                name.clone(),
                stats.calls.to_string(),
                format!("{:.6}", millis(stats.total)),
                format!("{:.6}", millis(stats.average())),
                format!("{:.6}", millis(stats.min)),
                format!("{:.6}", millis(stats.max)),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[inline]
fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
