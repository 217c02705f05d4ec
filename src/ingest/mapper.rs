//! Validated payload -> records.

use chrono::{DateTime, Utc};

use crate::domain::{
    GenerationEntry, GenerationRecord, GridMetrics, GridRecord, InterchangeEntry, InterchangeRecord, Record,
};
use crate::ingest::validate::ValidatedPayload;

/// All records produced by one cycle, sharing a single instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub grid: GridRecord,
    pub generation: Vec<GenerationRecord>,
    pub interchange: Vec<InterchangeRecord>,
}

impl RecordSet {
    pub fn record_count(&self) -> usize {
        1 + self.generation.len() + self.interchange.len()
    }

    /// Records in write order: grid, then generation, then interchange, each in input order.
    pub fn into_records(self) -> Vec<Record> {
        let mut out = Vec::with_capacity(self.record_count());
        out.push(Record::Grid(self.grid));
        out.extend(self.generation.into_iter().map(Record::Generation));
        out.extend(self.interchange.into_iter().map(Record::Interchange));
        out
    }
}

pub fn map_payload(payload: &ValidatedPayload) -> RecordSet {
    map_records(
        payload.instant,
        &payload.grid,
        &payload.generation,
        &payload.interchange,
    )
}

/// Values are carried through unchanged: no unit conversion, clamping or defaulting.
pub fn map_records(
    time: DateTime<Utc>,
    grid: &GridMetrics,
    generation: &[GenerationEntry],
    interchange: &[InterchangeEntry],
) -> RecordSet {
    RecordSet {
        grid: GridRecord {
            time,
            metrics: grid.clone(),
        },
        generation: generation
            .iter()
            .map(|g| GenerationRecord {
                time,
                fuel_type: g.fuel_type.clone(),
                aggregated_maximum_capability: g.aggregated_maximum_capability,
                aggregated_net_generation: g.aggregated_net_generation,
                aggregated_dispatched_contingency_reserve: g.aggregated_dispatched_contingency_reserve,
            })
            .collect(),
        interchange: interchange
            .iter()
            .map(|i| InterchangeRecord {
                time,
                path: i.path.clone(),
                actual_flow: i.actual_flow,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::validate::validate_payload;
    use serde_json::json;

    fn sample() -> ValidatedPayload {
        validate_payload(&json!({
            "last_updated_datetime_utc": "2024-03-01 12:00",
            "total_net_generation": 9000,
            "alberta_internal_load": 10100,
            "generation_data_list": [
                {"fuel_type": "GAS", "aggregated_maximum_capability": 12000, "aggregated_net_generation": 4000, "aggregated_dispatched_contingency_reserve": 100},
                {"fuel_type": "WIND", "aggregated_net_generation": 2500},
            ],
            "interchange_list": [
                {"path": "British Columbia", "actual_flow": 300},
                {"path": "Montana", "actual_flow": -80},
                {"path": "Saskatchewan", "actual_flow": 0},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn one_grid_record_plus_one_per_entry() {
        let payload = sample();
        let set = map_payload(&payload);

        assert_eq!(set.record_count(), 1 + 2 + 3);
        assert_eq!(set.grid.metrics.total_net_generation, Some(9000));
        assert_eq!(set.grid.metrics.net_to_grid_generation, None);

        let records = set.into_records();
        assert!(records.iter().all(|r| r.time() == payload.instant));
    }

    #[test]
    fn write_order_is_grid_generation_interchange() {
        let records = map_payload(&sample()).into_records();
        let measurements: Vec<_> = records.iter().map(Record::measurement).collect();
        assert_eq!(
            measurements,
            vec![
                "grid_data",
                "generation_data",
                "generation_data",
                "interchange_data",
                "interchange_data",
                "interchange_data",
            ]
        );

        let Record::Interchange(last) = &records[5] else {
            panic!("expected interchange record last");
        };
        assert_eq!(last.path.as_deref(), Some("Saskatchewan"));
        assert_eq!(last.actual_flow, Some(0));
    }

    #[test]
    fn mapping_is_repeatable() {
        let payload = sample();
        assert_eq!(map_payload(&payload), map_payload(&payload));
    }

    #[test]
    fn values_pass_through_unchanged() {
        let set = map_payload(&sample());
        let wind = &set.generation[1];
        assert_eq!(wind.fuel_type.as_deref(), Some("WIND"));
        assert_eq!(wind.aggregated_net_generation, Some(2500));
        assert_eq!(wind.aggregated_maximum_capability, None);
        assert_eq!(set.interchange[1].actual_flow, Some(-80));
    }
}
