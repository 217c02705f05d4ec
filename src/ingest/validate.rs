//! Response validation.
//!
//! Two tiers of severity:
//!
//! - **terminal**: no `return` object, or no usable timestamp. The cycle stops
//!   and nothing is written.
//! - **recoverable**: an optional list is not an array, one of its elements
//!   is not an entry, or a numeric value does not fit an integer field. That
//!   part is skipped and a `DataWarning` is recorded; everything else is
//!   still mapped.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{
    GENERATION_FIELDS, GRID_FIELDS, GenerationEntry, GridMetrics, INTERCHANGE_FIELDS, IntCoercion,
    InterchangeEntry, RawPayload, coerce_int,
};
use crate::error::{DataWarning, IngestError};
use crate::ingest::timestamp::normalize_timestamp;

pub const RETURN_FIELD: &str = "return";
pub const TIMESTAMP_FIELD: &str = "last_updated_datetime_utc";
pub const GENERATION_LIST_FIELD: &str = "generation_data_list";
pub const INTERCHANGE_LIST_FIELD: &str = "interchange_list";

/// A payload that passed the mandatory checks, plus what had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    pub instant: DateTime<Utc>,
    pub grid: GridMetrics,
    pub generation: Vec<GenerationEntry>,
    pub interchange: Vec<InterchangeEntry>,
    pub warnings: Vec<DataWarning>,
}

/// Extract the `return` object from a response body and validate it.
pub fn validate_response(body: &Value) -> Result<ValidatedPayload, IngestError> {
    let data = body
        .get(RETURN_FIELD)
        .filter(|v| !v.is_null())
        .ok_or_else(|| IngestError::SchemaViolation(format!("response has no '{RETURN_FIELD}' object")))?;

    validate_payload(data)
}

/// Validate the contents of the `return` object.
pub fn validate_payload(data: &Value) -> Result<ValidatedPayload, IngestError> {
    if !data.is_object() {
        return Err(IngestError::SchemaViolation(format!(
            "'{RETURN_FIELD}' is {}, expected an object",
            json_kind(data)
        )));
    }

    let raw: RawPayload = serde_json::from_value(data.clone())
        .map_err(|e| IngestError::SchemaViolation(format!("unreadable payload: {e}")))?;

    let timestamp = raw
        .last_updated_datetime_utc
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IngestError::SchemaViolation(format!("missing '{TIMESTAMP_FIELD}'")))?;
    let instant = normalize_timestamp(timestamp)?;

    let mut warnings: Vec<DataWarning> = out_of_range(data, &GRID_FIELDS)
        .map(|(name, value)| DataWarning::OutOfRange {
            field: name.to_string(),
            value,
        })
        .collect();
    let generation = read_list(
        GENERATION_LIST_FIELD,
        &GENERATION_FIELDS,
        raw.generation_data_list.as_ref(),
        &mut warnings,
    );
    let interchange = read_list(
        INTERCHANGE_LIST_FIELD,
        &INTERCHANGE_FIELDS,
        raw.interchange_list.as_ref(),
        &mut warnings,
    );

    Ok(ValidatedPayload {
        instant,
        grid: raw.grid,
        generation,
        interchange,
        warnings,
    })
}

/// Read an optional list best-effort. `None` (absent or `null`) is not a warning.
fn read_list<T: DeserializeOwned>(
    field: &'static str,
    numeric: &[&'static str],
    value: Option<&Value>,
    warnings: &mut Vec<DataWarning>,
) -> Vec<T> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        warnings.push(DataWarning::ListNotArray {
            field,
            found: json_kind(value),
        });
        return Vec::new();
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            warnings.push(DataWarning::InvalidEntry {
                field,
                index,
                reason: format!("expected an object, found {}", json_kind(item)),
            });
            continue;
        }
        match serde_json::from_value::<T>(item.clone()) {
            Ok(entry) => {
                warnings.extend(out_of_range(item, numeric).map(|(name, value)| {
                    DataWarning::OutOfRange {
                        field: format!("{field}[{index}].{name}"),
                        value,
                    }
                }));
                out.push(entry);
            }
            Err(e) => warnings.push(DataWarning::InvalidEntry {
                field,
                index,
                reason: e.to_string(),
            }),
        }
    }
    out
}

/// Named numeric fields of `object` whose value is too large for an `i64`.
fn out_of_range<'a>(
    object: &'a Value,
    names: &'a [&'static str],
) -> impl Iterator<Item = (&'static str, String)> + 'a {
    names.iter().filter_map(move |name| {
        let value = object.get(*name)?;
        (coerce_int(value) == IntCoercion::OutOfRange).then(|| (*name, value.to_string()))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
