use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::StreamExt;
use hdrhistogram::Histogram;

use crate::collector::Collector;

/// Result of a single request attempt. `status` is 0 when the request could
/// not be built or the call failed before a response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: u16,
    pub duration: Duration,
}

impl Outcome {
    pub fn new(status: u16, duration: Duration) -> Self {
        Outcome { status, duration }
    }

    pub fn failed(duration: Duration) -> Self {
        Outcome { status: 0, duration }
    }

    /// Attempts that never reached the network carry no timing.
    fn is_timed(&self) -> bool {
        self.status != 0 || !self.duration.is_zero()
    }
}

pub struct Summary {
    pub total: u64,
    pub success: u64,
    /// Every status other than 200, including 0 for failures.
    pub distribution: BTreeMap<u16, u64>,
    pub elapsed: Duration,
    latency: Histogram<u64>,
}

impl Summary {
    pub fn new() -> Result<Self> {
        Ok(Summary {
            total: 0,
            success: 0,
            distribution: BTreeMap::new(),
            elapsed: Duration::ZERO,
            latency: Histogram::<u64>::new(3)?,
        })
    }

    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;
        if outcome.status == 200 {
            self.success += 1;
        } else {
            *self.distribution.entry(outcome.status).or_insert(0) += 1;
        }
        if outcome.is_timed() {
            let micros = outcome.duration.as_micros() as u64;
            self.latency.record(micros).unwrap_or_default();
        }
    }

    pub fn from_outcomes<'a, I>(outcomes: I, elapsed: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Outcome>,
    {
        let mut summary = Summary::new()?;
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary.elapsed = elapsed;
        Ok(summary)
    }

    /// Drains the collector to exhaustion. `started` is the instant dispatch began.
    pub async fn collect(mut collector: Collector, started: Instant) -> Result<Self> {
        let mut summary = Summary::new()?;
        while let Some(outcome) = collector.next().await {
            summary.record(&outcome);
        }
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    pub fn latency_samples(&self) -> u64 {
        self.latency.len()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total time: {:?}", self.elapsed)?;
        writeln!(f, "Total requests: {}", self.total)?;
        writeln!(f, "Requests with HTTP 200: {}", self.success)?;
        writeln!(f, "Other status codes:")?;
        for (status, count) in &self.distribution {
            writeln!(f, "  HTTP {}: {}", status, count)?;
        }

        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            writeln!(f, "\nRequests/sec: {:.2}", self.total as f64 / secs)?;
        }

        if !self.latency.is_empty() {
            writeln!(f, "\nLatency:")?;
            writeln!(f, "  Avg: {:.2}ms", self.latency.mean() / 1000.0)?;
            writeln!(f, "  Min: {:.2}ms", self.latency.min() as f64 / 1000.0)?;
            writeln!(f, "  Max: {:.2}ms", self.latency.max() as f64 / 1000.0)?;
            writeln!(f, "  P50: {:.2}ms", self.latency.value_at_quantile(0.50) as f64 / 1000.0)?;
            writeln!(f, "  P99: {:.2}ms", self.latency.value_at_quantile(0.99) as f64 / 1000.0)?;
        }
        Ok(())
    }
}
