//! One ingestion cycle.
//!
//! Fetching -> Validating -> Mapping -> Writing -> Flushed, or Failed from
//! Fetching, Validating or Writing. Every failure is caught here and turned
//! into a `CycleReport`; nothing escapes to the scheduler.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::data::GridSource;
use crate::error::{DataWarning, IngestError};
use crate::ingest::{map_payload, validate_response};
use crate::sink::PointWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Validating,
    Mapping,
    Writing,
    Flushed,
    Failed,
}

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// `Flushed` or `Failed`.
    pub state: CycleState,
    /// The state the cycle was in when it failed.
    pub failed_in: Option<CycleState>,
    pub instant: Option<DateTime<Utc>>,
    /// Records handed to the writer.
    pub records: usize,
    pub warnings: Vec<DataWarning>,
    pub error: Option<IngestError>,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            state: CycleState::Idle,
            failed_in: None,
            instant: None,
            records: 0,
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn is_flushed(&self) -> bool {
        self.state == CycleState::Flushed
    }

    fn enter(&mut self, next: CycleState) {
        debug!(from = ?self.state, to = ?next, "cycle transition");
        self.state = next;
    }

    fn fail(mut self, err: IngestError) -> Self {
        error!(stage = ?self.state, error = %err, "cycle failed");
        self.failed_in = Some(self.state);
        self.enter(CycleState::Failed);
        self.error = Some(err);
        self
    }
}

/// Run one fetch -> validate -> map -> write -> flush cycle.
pub async fn run_cycle(source: &dyn GridSource, writer: &dyn PointWriter) -> CycleReport {
    let mut report = CycleReport::new();

    report.enter(CycleState::Fetching);
    info!(source = source.name(), "fetching report");
    let body = match source.fetch().await {
        Ok(body) => body,
        Err(e) => return report.fail(e),
    };

    report.enter(CycleState::Validating);
    let payload = match validate_response(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(body = %body, "rejected response");
            return report.fail(e);
        }
    };
    info!(timestamp = %payload.instant, "report received");
    for warning in &payload.warnings {
        warn!(%warning, "part of the report was skipped");
    }
    report.instant = Some(payload.instant);
    report.warnings = payload.warnings.clone();

    report.enter(CycleState::Mapping);
    let records = map_payload(&payload).into_records();

    report.enter(CycleState::Writing);
    for record in records {
        let point = record.to_point();
        debug!(
            measurement = point.measurement,
            tags = ?point.tags,
            fields = point.fields.len(),
            "point buffered"
        );
        writer.write_point(point);
        report.records += 1;
    }

    if let Err(e) = writer.flush().await {
        return report.fail(e);
    }
    report.enter(CycleState::Flushed);
    info!(
        writer = writer.name(),
        records = report.records,
        warnings = report.warnings.len(),
        "cycle flushed"
    );
    report
}
