//! Shared domain types.
//!
//! Two families live here:
//!
//! - the typed view of the source payload (`RawPayload` and its entries)
//! - the records produced each cycle and the `Point` they are written as

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const GRID_MEASUREMENT: &str = "grid_data";
pub const GENERATION_MEASUREMENT: &str = "generation_data";
pub const INTERCHANGE_MEASUREMENT: &str = "interchange_data";

pub const FUEL_TYPE_TAG: &str = "fuel_type";
pub const PATH_TAG: &str = "path";

/// The recognized fields of the response's `return` object.
///
/// Unknown fields are ignored. The two lists are kept as raw JSON because
/// their shape is validated separately: a malformed list degrades the cycle,
/// it does not abort it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub last_updated_datetime_utc: Option<String>,
    #[serde(flatten)]
    pub grid: GridMetrics,
    #[serde(default)]
    pub generation_data_list: Option<Value>,
    #[serde(default)]
    pub interchange_list: Option<Value>,
}

/// Scalar grid metrics (MW). Every field is optional and carried as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GridMetrics {
    #[serde(default, deserialize_with = "lenient_int")]
    pub total_max_generation_capability: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub total_net_generation: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub net_to_grid_generation: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub net_actual_interchange: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub alberta_internal_load: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub contingency_reserve_required: Option<i64>,
    /// Spelled as the source spells it.
    #[serde(default, deserialize_with = "lenient_int")]
    pub dispatched_contigency_reserve_total: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub dispatched_contingency_reserve_gen: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub dispatched_contingency_reserve_other: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub lssi_armed_dispatch: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub lssi_offered_volume: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub long_lead_time_volume: Option<i64>,
}

impl GridMetrics {
    /// Field name/value pairs in write order.
    pub fn fields(&self) -> [(&'static str, Option<i64>); 12] {
        [
            ("total_max_generation_capability", self.total_max_generation_capability),
            ("total_net_generation", self.total_net_generation),
            ("net_to_grid_generation", self.net_to_grid_generation),
            ("net_actual_interchange", self.net_actual_interchange),
            ("alberta_internal_load", self.alberta_internal_load),
            ("contingency_reserve_required", self.contingency_reserve_required),
            ("dispatched_contigency_reserve_total", self.dispatched_contigency_reserve_total),
            ("dispatched_contingency_reserve_gen", self.dispatched_contingency_reserve_gen),
            ("dispatched_contingency_reserve_other", self.dispatched_contingency_reserve_other),
            ("lssi_armed_dispatch", self.lssi_armed_dispatch),
            ("lssi_offered_volume", self.lssi_offered_volume),
            ("long_lead_time_volume", self.long_lead_time_volume),
        ]
    }
}

/// One element of `generation_data_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerationEntry {
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub aggregated_maximum_capability: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub aggregated_net_generation: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub aggregated_dispatched_contingency_reserve: Option<i64>,
}

/// One element of `interchange_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InterchangeEntry {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub actual_flow: Option<i64>,
}

/// Numeric field names of the grid metrics, in write order.
pub const GRID_FIELDS: [&str; 12] = [
    "total_max_generation_capability",
    "total_net_generation",
    "net_to_grid_generation",
    "net_actual_interchange",
    "alberta_internal_load",
    "contingency_reserve_required",
    "dispatched_contigency_reserve_total",
    "dispatched_contingency_reserve_gen",
    "dispatched_contingency_reserve_other",
    "lssi_armed_dispatch",
    "lssi_offered_volume",
    "long_lead_time_volume",
];

pub const GENERATION_FIELDS: [&str; 3] = [
    "aggregated_maximum_capability",
    "aggregated_net_generation",
    "aggregated_dispatched_contingency_reserve",
];

pub const INTERCHANGE_FIELDS: [&str; 1] = ["actual_flow"];

/// Outcome of reading one JSON value as an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntCoercion {
    Int(i64),
    /// Not a number: `null`, booleans, objects, non-numeric strings.
    Absent,
    /// Numeric, but its floor does not fit in an `i64`.
    OutOfRange,
}

/// Accept integers, floats (floored) and numeric strings; anything else is absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(int_from_value(&value))
}

/// Out-of-range values are absent here; `coerce_int` tells them apart.
pub fn int_from_value(value: &Value) -> Option<i64> {
    match coerce_int(value) {
        IntCoercion::Int(v) => Some(v),
        IntCoercion::Absent | IntCoercion::OutOfRange => None,
    }
}

pub fn coerce_int(value: &Value) -> IntCoercion {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => IntCoercion::Int(v),
            None => n.as_f64().map_or(IntCoercion::Absent, floor_to_int),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => IntCoercion::Int(v),
                Err(_) => s.parse::<f64>().map_or(IntCoercion::Absent, floor_to_int),
            }
        }
        _ => IntCoercion::Absent,
    }
}

fn floor_to_int(f: f64) -> IntCoercion {
    // 2^63, exactly representable.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !f.is_finite() {
        return IntCoercion::Absent;
    }
    let f = f.floor();
    if f < -LIMIT || f >= LIMIT {
        IntCoercion::OutOfRange
    } else {
        IntCoercion::Int(f as i64)
    }
}

/// The once-per-cycle scalar record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRecord {
    pub time: DateTime<Utc>,
    pub metrics: GridMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRecord {
    pub time: DateTime<Utc>,
    pub fuel_type: Option<String>,
    pub aggregated_maximum_capability: Option<i64>,
    pub aggregated_net_generation: Option<i64>,
    pub aggregated_dispatched_contingency_reserve: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterchangeRecord {
    pub time: DateTime<Utc>,
    pub path: Option<String>,
    pub actual_flow: Option<i64>,
}

/// Any record a cycle can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Grid(GridRecord),
    Generation(GenerationRecord),
    Interchange(InterchangeRecord),
}

impl Record {
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Record::Grid(r) => r.time,
            Record::Generation(r) => r.time,
            Record::Interchange(r) => r.time,
        }
    }

    pub fn measurement(&self) -> &'static str {
        match self {
            Record::Grid(_) => GRID_MEASUREMENT,
            Record::Generation(_) => GENERATION_MEASUREMENT,
            Record::Interchange(_) => INTERCHANGE_MEASUREMENT,
        }
    }

    /// Convert into the store-facing point. Absent values become absent tags/fields.
    pub fn to_point(&self) -> Point {
        let (tags, fields): (Vec<(&'static str, Option<String>)>, Vec<(&'static str, Option<i64>)>) =
            match self {
                Record::Grid(r) => (Vec::new(), r.metrics.fields().to_vec()),
                Record::Generation(r) => (
                    vec![(FUEL_TYPE_TAG, r.fuel_type.clone())],
                    vec![
                        ("aggregated_maximum_capability", r.aggregated_maximum_capability),
                        ("aggregated_net_generation", r.aggregated_net_generation),
                        (
                            "aggregated_dispatched_contingency_reserve",
                            r.aggregated_dispatched_contingency_reserve,
                        ),
                    ],
                ),
                Record::Interchange(r) => (
                    vec![(PATH_TAG, r.path.clone())],
                    vec![("actual_flow", r.actual_flow)],
                ),
            };

        Point {
            measurement: self.measurement(),
            tags: tags
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
            fields: fields
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
            time: self.time(),
        }
    }
}

/// A single write unit: measurement, tags, integer fields, instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub measurement: &'static str,
    pub tags: Vec<(&'static str, String)>,
    pub fields: Vec<(&'static str, i64)>,
    pub time: DateTime<Utc>,
}

impl Point {
    pub fn field(&self, name: &str) -> Option<i64> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}
