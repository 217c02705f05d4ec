//! Writer adapters for the time-series store.
//!
//! A writer buffers points as they are produced and submits them in one batch
//! when flushed. One writer is created at startup and shared by every cycle.

pub mod influx;
pub mod line_protocol;
pub mod memory;

use async_trait::async_trait;

use crate::domain::Point;
use crate::error::IngestError;

pub use influx::InfluxWriter;
pub use line_protocol::encode_point;
pub use memory::MemoryWriter;

/// Buffered, batch-flushing point writer.
#[async_trait]
pub trait PointWriter: Send + Sync {
    /// Writer name for logging.
    fn name(&self) -> &'static str;

    /// Append a point to the buffer. Never waits on I/O.
    fn write_point(&self, point: Point);

    /// Submit everything buffered so far.
    ///
    /// Returns `IngestError::WriteFailure` if the store rejects the batch.
    /// The failed batch is not kept.
    async fn flush(&self) -> Result<(), IngestError>;

    /// Flush what remains and stop accepting points.
    ///
    /// Returns `IngestError::ShutdownFailure` if the final flush fails.
    async fn close(&self) -> Result<(), IngestError>;
}
