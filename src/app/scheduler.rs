//! Fixed-cadence cycle scheduling.
//!
//! Every tick spawns an independent cycle task. Under `OverlapPolicy::Allow`
//! a slow cycle does not hold back the next tick, so cycles may overlap and
//! share the writer buffer. On shutdown no new ticks are taken; in-flight
//! cycles get a grace period and are aborted after it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::app::pipeline::{CycleReport, run_cycle};
use crate::config::{OverlapPolicy, ScheduleConfig};
use crate::data::GridSource;
use crate::sink::PointWriter;

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    overlap: OverlapPolicy,
    shutdown_grace: Duration,
    align: bool,
}

/// Counters for one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub started: u64,
    pub skipped: u64,
    pub flushed: u64,
    pub failed: u64,
    pub aborted: u64,
}

impl Scheduler {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            interval: config.interval,
            overlap: config.overlap,
            shutdown_grace: config.shutdown_grace,
            align: true,
        }
    }

    /// Whether the first tick waits for the next wall-clock boundary of the interval.
    pub fn with_alignment(mut self, align: bool) -> Self {
        self.align = align;
        self
    }

    /// Tick until `shutdown` is cancelled, then wind down in-flight cycles.
    pub async fn run(
        &self,
        source: Arc<dyn GridSource>,
        writer: Arc<dyn PointWriter>,
        shutdown: CancellationToken,
    ) -> SchedulerStats {
        let mut stats = SchedulerStats::default();
        let mut in_flight: JoinSet<CycleReport> = JoinSet::new();

        let delay = if self.align {
            delay_to_next_boundary(Utc::now(), self.interval)
        } else {
            Duration::ZERO
        };
        info!(
            interval_secs = self.interval.as_secs(),
            first_tick_in_ms = delay.as_millis() as u64,
            overlap = ?self.overlap,
            "scheduler started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    record(&mut stats, joined);
                }
                _ = ticker.tick() => {
                    if self.overlap == OverlapPolicy::Skip && !in_flight.is_empty() {
                        stats.skipped += 1;
                        warn!(in_flight = in_flight.len(), "previous cycle still running, tick skipped");
                        continue;
                    }
                    stats.started += 1;
                    let span = info_span!("cycle", id = stats.started);
                    let source = Arc::clone(&source);
                    let writer = Arc::clone(&writer);
                    in_flight.spawn(
                        async move { run_cycle(source.as_ref(), writer.as_ref()).await }.instrument(span),
                    );
                }
            }
        }

        info!(in_flight = in_flight.len(), "shutdown requested, no further ticks");
        self.drain(&mut in_flight, &mut stats).await;
        stats
    }

    async fn drain(&self, in_flight: &mut JoinSet<CycleReport>, stats: &mut SchedulerStats) {
        if in_flight.is_empty() {
            return;
        }

        let wait_all = async {
            while let Some(joined) = in_flight.join_next().await {
                record(stats, joined);
            }
        };
        if tokio::time::timeout(self.shutdown_grace, wait_all).await.is_err() {
            let remaining = in_flight.len() as u64;
            error!(
                remaining,
                grace_secs = self.shutdown_grace.as_secs(),
                "in-flight cycles did not finish within the grace period, aborting"
            );
            stats.aborted += remaining;
            in_flight.shutdown().await;
        }
    }
}

fn record(stats: &mut SchedulerStats, joined: Result<CycleReport, JoinError>) {
    match joined {
        Ok(report) if report.is_flushed() => stats.flushed += 1,
        Ok(_) => stats.failed += 1,
        Err(e) => {
            error!(error = %e, "cycle task panicked");
            stats.failed += 1;
        }
    }
    debug!(?stats, "cycle finished");
}

/// Time from `now` until the next multiple of `interval` since the Unix epoch.
///
/// For a 60 s interval that is the top of the next minute.
pub fn delay_to_next_boundary(now: DateTime<Utc>, interval: Duration) -> Duration {
    let period = interval.as_millis() as i64;
    if period <= 0 {
        return Duration::ZERO;
    }
    let rem = now.timestamp_millis().rem_euclid(period);
    if rem == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((period - rem) as u64)
    }
}
