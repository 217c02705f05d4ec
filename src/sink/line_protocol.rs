//! InfluxDB line protocol encoding.
//!
//! `measurement[,tag=value...] field=<int>i[,field=<int>i...] <unix-ns>`

use std::fmt::Write;

use crate::domain::Point;

/// Encode one point. Returns `None` when the point has no fields (line
/// protocol requires at least one) or its instant does not fit in i64 ns.
pub fn encode_point(point: &Point) -> Option<String> {
    if point.fields.is_empty() {
        return None;
    }
    let nanos = point.time.timestamp_nanos_opt()?;

    let mut line = String::with_capacity(64 + point.fields.len() * 32);
    line.push_str(&escape_measurement(point.measurement));

    for (key, value) in &point.tags {
        // Empty tag values are not allowed by the protocol; drop the tag.
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    for (idx, (key, value)) in point.fields.iter().enumerate() {
        line.push(if idx == 0 { ' ' } else { ',' });
        line.push_str(&escape_key(key));
        // Writing into a String cannot fail.
        let _ = write!(line, "={value}i");
    }

    let _ = write!(line, " {nanos}");
    Some(line)
}

fn escape_measurement(raw: &str) -> String {
    escape(raw, &[',', ' '])
}

/// Tag keys, tag values and field keys share one escaping rule.
fn escape_key(raw: &str) -> String {
    escape(raw, &[',', '=', ' '])
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at_noon() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn grid_point_has_no_tags_and_integer_suffixes() {
        let point = Point {
            measurement: "grid_data",
            tags: Vec::new(),
            fields: vec![("total_net_generation", 9000), ("net_actual_interchange", -250)],
            time: at_noon(),
        };
        assert_eq!(
            encode_point(&point).unwrap(),
            "grid_data total_net_generation=9000i,net_actual_interchange=-250i 1709294400000000000"
        );
    }

    #[test]
    fn tag_values_are_escaped() {
        let point = Point {
            measurement: "interchange_data",
            tags: vec![("path", "British Columbia,AB=1".to_string())],
            fields: vec![("actual_flow", 300)],
            time: at_noon(),
        };
        assert_eq!(
            encode_point(&point).unwrap(),
            r"interchange_data,path=British\ Columbia\,AB\=1 actual_flow=300i 1709294400000000000"
        );
    }

    #[test]
    fn empty_tag_value_is_dropped() {
        let point = Point {
            measurement: "generation_data",
            tags: vec![("fuel_type", String::new())],
            fields: vec![("aggregated_net_generation", 1)],
            time: at_noon(),
        };
        assert!(encode_point(&point).unwrap().starts_with("generation_data aggregated_net_generation=1i"));
    }

    #[test]
    fn point_without_fields_is_not_encodable() {
        let point = Point {
            measurement: "grid_data",
            tags: Vec::new(),
            fields: Vec::new(),
            time: at_noon(),
        };
        assert_eq!(encode_point(&point), None);
    }
}
