//! Source timestamp normalization.
//!
//! The feed stamps each report with `yyyy-MM-dd HH:mm` in UTC. chrono's numeric
//! specifiers accept variable widths, so the layout is checked byte-by-byte
//! before chrono validates the calendar values.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::IngestError;

pub const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const LAYOUT: &[u8; 16] = b"dddd-dd-dd dd:dd";

/// Parse a source timestamp as a UTC instant with minute precision.
pub fn normalize_timestamp(raw: &str) -> Result<DateTime<Utc>, IngestError> {
    let malformed = || IngestError::MalformedTimestamp(raw.to_string());

    if !matches_layout(raw) {
        return Err(malformed());
    }

    let naive = NaiveDateTime::parse_from_str(raw, SOURCE_TIMESTAMP_FORMAT).map_err(|_| malformed())?;
    Ok(naive.and_utc())
}

fn matches_layout(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == LAYOUT.len()
        && bytes.iter().zip(LAYOUT.iter()).all(|(&b, &expected)| match expected {
            b'd' => b.is_ascii_digit(),
            sep => b == sep,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn parses_as_utc_minute() {
        let instant = normalize_timestamp("2024-01-15 08:30").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap());
        assert_eq!(instant.to_rfc3339(), "2024-01-15T08:30:00+00:00");
        assert_eq!(instant.second(), 0);
        assert_eq!(instant.nanosecond(), 0);
    }

    #[test]
    fn same_input_same_instant() {
        let a = normalize_timestamp("2024-03-01 12:00").unwrap();
        let b = normalize_timestamp("2024-03-01 12:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.timestamp(), 1_709_294_400);
    }

    #[test]
    fn rejects_layout_deviations() {
        for raw in [
            "",
            "2024-01-15",
            "15/01/2024 08:30",
            "2024-01-15 08:30:00",
            "2024-01-15T08:30",
            "2024-1-15 08:30",
            "2024-01-15 8:30",
            " 2024-01-15 08:30",
            "2024-01-15 08:30 ",
            "+2024-01-15 08:30",
        ] {
            assert_eq!(
                normalize_timestamp(raw),
                Err(IngestError::MalformedTimestamp(raw.to_string())),
                "expected '{raw}' to be rejected"
            );
        }
    }

    #[test]
    fn rejects_impossible_calendar_values() {
        for raw in ["2024-02-30 10:00", "2024-13-01 10:00", "2024-01-15 24:00", "2024-01-15 10:60"] {
            assert!(normalize_timestamp(raw).is_err(), "expected '{raw}' to be rejected");
        }
    }

    #[test]
    fn accepts_leap_day() {
        let instant = normalize_timestamp("2024-02-29 23:59").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap());
    }
}
