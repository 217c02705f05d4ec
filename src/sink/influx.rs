//! InfluxDB v2 writer over the HTTP line protocol endpoint.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::config::InfluxConfig;
use crate::domain::Point;
use crate::error::{AppError, IngestError};
use crate::sink::PointWriter;
use crate::sink::line_protocol::encode_point;

const WRITE_PATH: &str = "/api/v2/write";

pub struct InfluxWriter {
    client: Client,
    write_url: String,
    org: String,
    bucket: String,
    token: String,
    batch_size: usize,
    buffer: Mutex<Vec<Point>>,
    closed: AtomicBool,
}

impl InfluxWriter {
    pub fn new(config: &InfluxConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build InfluxDB client: {e}")))?;

        Ok(Self {
            client,
            write_url: write_url(&config.url),
            org: config.org.clone(),
            bucket: config.bucket.clone(),
            token: config.token.clone(),
            batch_size: config.batch_size.max(1),
            buffer: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn buffered(&self) -> usize {
        self.buffer.lock().len()
    }

    async fn post(&self, body: String, lines: usize) -> Result<(), IngestError> {
        let resp = self
            .client
            .post(&self.write_url)
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| IngestError::WriteFailure(format!("InfluxDB request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(IngestError::WriteFailure(format!(
                "InfluxDB write failed with status {status}: {}",
                detail.trim()
            )));
        }

        debug!(bucket = %self.bucket, lines, %status, "batch accepted");
        Ok(())
    }
}

#[async_trait]
impl PointWriter for InfluxWriter {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    fn write_point(&self, point: Point) {
        if self.closed.load(Ordering::Acquire) {
            warn!(measurement = point.measurement, "writer closed, point dropped");
            return;
        }
        self.buffer.lock().push(point);
    }

    async fn flush(&self) -> Result<(), IngestError> {
        // Drain before awaiting so the lock is never held across the request.
        let points = std::mem::take(&mut *self.buffer.lock());
        if points.is_empty() {
            return Ok(());
        }

        let lines = encode_all(&points);
        for chunk in lines.chunks(self.batch_size) {
            self.post(chunk.join("\n"), chunk.len()).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), IngestError> {
        self.closed.store(true, Ordering::Release);
        self.flush()
            .await
            .map_err(|e| IngestError::ShutdownFailure(e.to_string()))
    }
}

fn write_url(base: &str) -> String {
    format!("{}{WRITE_PATH}", base.trim_end_matches('/'))
}

/// Encode points, dropping the ones line protocol cannot express.
pub(crate) fn encode_all(points: &[Point]) -> Vec<String> {
    points
        .iter()
        .filter_map(|p| {
            let line = encode_point(p);
            if line.is_none() {
                warn!(measurement = p.measurement, time = %p.time, "point has no fields, skipped");
            }
            line
        })
        .collect()
}
