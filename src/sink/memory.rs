//! In-memory writer.
//!
//! Records every call it receives, in order, so cycle behaviour can be
//! asserted without a store. Also backs `once --dry-run`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::Point;
use crate::error::IngestError;
use crate::sink::PointWriter;
use crate::sink::influx::encode_all;

/// One observed call on the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterEvent {
    Write(Point),
    Flush,
    Close,
}

#[derive(Default)]
pub struct MemoryWriter {
    events: Mutex<Vec<WriterEvent>>,
    buffer: Mutex<Vec<Point>>,
    batches: Mutex<Vec<Vec<Point>>>,
    fail_flush: AtomicBool,
    closed: AtomicBool,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent flush fail.
    pub fn fail_flushes(&self, fail: bool) {
        self.fail_flush.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<WriterEvent> {
        self.events.lock().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, WriterEvent::Flush))
            .count()
    }

    /// Points accepted by successful flushes, one entry per flush.
    pub fn batches(&self) -> Vec<Vec<Point>> {
        self.batches.lock().clone()
    }

    pub fn flushed_points(&self) -> Vec<Point> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Flushed points as line protocol.
    pub fn flushed_lines(&self) -> Vec<String> {
        encode_all(&self.flushed_points())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointWriter for MemoryWriter {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write_point(&self, point: Point) {
        self.events.lock().push(WriterEvent::Write(point.clone()));
        if self.is_closed() {
            return;
        }
        self.buffer.lock().push(point);
    }

    async fn flush(&self) -> Result<(), IngestError> {
        self.events.lock().push(WriterEvent::Flush);
        let points = std::mem::take(&mut *self.buffer.lock());
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(IngestError::WriteFailure(format!(
                "memory writer rejected {} points",
                points.len()
            )));
        }
        if !points.is_empty() {
            self.batches.lock().push(points);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), IngestError> {
        self.events.lock().push(WriterEvent::Close);
        self.closed.store(true, Ordering::SeqCst);
        let points = std::mem::take(&mut *self.buffer.lock());
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(IngestError::ShutdownFailure(format!(
                "memory writer rejected {} points on close",
                points.len()
            )));
        }
        if !points.is_empty() {
            self.batches.lock().push(points);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn point(value: i64) -> Point {
        Point {
            measurement: "interchange_data",
            tags: vec![("path", "BC".to_string())],
            fields: vec![("actual_flow", value)],
            time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn flush_moves_buffer_into_a_batch() {
        let writer = MemoryWriter::new();
        writer.write_point(point(1));
        writer.write_point(point(2));
        writer.flush().await.unwrap();
        writer.flush().await.unwrap();

        assert_eq!(writer.batches().len(), 1);
        assert_eq!(writer.flush_count(), 2);
        assert_eq!(
            writer.flushed_lines(),
            vec![
                "interchange_data,path=BC actual_flow=1i 1709294400000000000".to_string(),
                "interchange_data,path=BC actual_flow=2i 1709294400000000000".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn failed_flush_drops_the_batch() {
        let writer = MemoryWriter::new();
        writer.fail_flushes(true);
        writer.write_point(point(1));
        assert!(matches!(writer.flush().await, Err(IngestError::WriteFailure(_))));

        writer.fail_flushes(false);
        writer.flush().await.unwrap();
        assert!(writer.flushed_points().is_empty());
    }

    #[tokio::test]
    async fn close_flushes_remaining_points() {
        let writer = MemoryWriter::new();
        writer.write_point(point(5));
        writer.close().await.unwrap();
        writer.write_point(point(6));

        assert!(writer.is_closed());
        assert_eq!(writer.flushed_points(), vec![point(5)]);
    }
}
