#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use grid_ingest::data::GridSource;
use grid_ingest::error::IngestError;
use serde_json::{Value, json};

/// Source that answers every fetch with the same body, optionally after a delay.
pub struct FakeSource {
    body: Result<Value, IngestError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn ok(body: Value) -> Self {
        Self {
            body: Ok(body),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: IngestError) -> Self {
        Self {
            body: Err(err),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GridSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self) -> Result<Value, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.body.clone()
    }
}

/// A full report as the endpoint returns it.
pub fn full_report() -> Value {
    json!({
        "timestamp": "2024-01-15 08:31:07.123+0000",
        "responseCode": "200",
        "return": {
            "last_updated_datetime_utc": "2024-01-15 08:30",
            "last_updated_datetime_mpt": "2024-01-15 01:30",
            "total_max_generation_capability": 17500,
            "total_net_generation": 11200,
            "net_to_grid_generation": 10300,
            "net_actual_interchange": -410,
            "alberta_internal_load": 11610,
            "contingency_reserve_required": 520,
            "dispatched_contigency_reserve_total": 540,
            "dispatched_contingency_reserve_gen": 390,
            "dispatched_contingency_reserve_other": 150,
            "lssi_armed_dispatch": 0,
            "lssi_offered_volume": 240,
            "long_lead_time_volume": 0,
            "generation_data_list": [
                {"fuel_type": "GAS", "aggregated_maximum_capability": 11900, "aggregated_net_generation": 8200, "aggregated_dispatched_contingency_reserve": 300},
                {"fuel_type": "WIND", "aggregated_maximum_capability": 4400, "aggregated_net_generation": 1900, "aggregated_dispatched_contingency_reserve": 0},
                {"fuel_type": "HYDRO", "aggregated_maximum_capability": 900, "aggregated_net_generation": 350, "aggregated_dispatched_contingency_reserve": 90}
            ],
            "interchange_list": [
                {"path": "British Columbia", "actual_flow": -300},
                {"path": "Montana", "actual_flow": -110}
            ]
        }
    })
}
