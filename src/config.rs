//! Runtime configuration.
//!
//! Everything comes from the environment; a `.env` file in the working
//! directory is loaded first if present. Parsing goes through a lookup
//! function so it can be exercised without touching the process environment.

use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub influx: InfluxConfig,
    pub source: SourceConfig,
    pub schedule: ScheduleConfig,
    pub log_format: LogFormat,
}

/// Write side.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Maximum lines per write request.
    pub batch_size: usize,
}

/// Read side.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub overlap: OverlapPolicy,
    /// How long in-flight cycles may keep running after a shutdown signal.
    pub shutdown_grace: Duration,
}

/// What to do when a tick fires while the previous cycle is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Start another cycle anyway; both share the writer buffer.
    Allow,
    /// Skip the tick.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, AppError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::new(2, format!("Missing {key} in environment (.env).")))
        };

        let influx = InfluxConfig {
            url: required("INFLUXDB_URL")?,
            token: required("INFLUXDB_TOKEN")?,
            org: required("INFLUXDB_ORG")?,
            bucket: required("INFLUXDB_BUCKET")?,
            batch_size: parse_optional(&lookup, "INFLUXDB_BATCH_SIZE")?.unwrap_or(DEFAULT_BATCH_SIZE),
        };
        if influx.batch_size == 0 {
            return Err(AppError::new(2, "INFLUXDB_BATCH_SIZE must be > 0."));
        }

        let source = SourceConfig {
            url: required("AESO_API_URL")?,
            api_key: required("AESO_API_KEY")?,
        };

        let interval_secs: u64 =
            parse_optional(&lookup, "INGEST_INTERVAL_SECS")?.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(AppError::new(2, "INGEST_INTERVAL_SECS must be > 0."));
        }
        let grace_secs: u64 =
            parse_optional(&lookup, "INGEST_SHUTDOWN_GRACE_SECS")?.unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS);

        let overlap = match lookup("INGEST_OVERLAP").map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("allow") => OverlapPolicy::Allow,
            Some("skip") => OverlapPolicy::Skip,
            Some(other) => {
                return Err(AppError::new(
                    2,
                    format!("Invalid INGEST_OVERLAP '{other}' (expected 'allow' or 'skip')."),
                ));
            }
        };

        let log_format = match lookup("INGEST_LOG_FORMAT").map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::new(
                    2,
                    format!("Invalid INGEST_LOG_FORMAT '{other}' (expected 'pretty' or 'json')."),
                ));
            }
        };

        Ok(Self {
            influx,
            source,
            schedule: ScheduleConfig {
                interval: Duration::from_secs(interval_secs),
                overlap,
                shutdown_grace: Duration::from_secs(grace_secs),
            },
            log_format,
        })
    }
}

/// Log format is needed before the rest of the config is validated, so
/// logging can be up when a config error is reported.
pub fn log_format_from_env() -> LogFormat {
    match std::env::var("INGEST_LOG_FORMAT").map(|v| v.trim().to_lowercase()).as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| AppError::new(2, format!("Invalid {key} '{v}': {e}"))),
    }
}
