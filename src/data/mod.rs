//! Read-side data sources.

pub mod aeso;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::IngestError;

pub use aeso::AesoClient;

/// Something that can produce one report body per call.
#[async_trait]
pub trait GridSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the full response body. Any transport problem, non-success
    /// status or non-JSON body is an `IngestError::TransportFailure`.
    async fn fetch(&self) -> Result<Value, IngestError>;
}
