//! AESO current supply/demand report client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::SourceConfig;
use crate::data::GridSource;
use crate::error::{AppError, IngestError};

const API_KEY_HEADER: &str = "X-API-Key";

pub struct AesoClient {
    client: Client,
    url: String,
    api_key: String,
}

impl AesoClient {
    pub fn new(config: &SourceConfig) -> Result<Self, AppError> {
        // No request timeout: a hung fetch only stalls its own cycle.
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build AESO client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl GridSource for AesoClient {
    fn name(&self) -> &'static str {
        "aeso"
    }

    async fn fetch(&self) -> Result<Value, IngestError> {
        let resp = self
            .client
            .get(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| IngestError::TransportFailure(format!("AESO request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::TransportFailure(format!(
                "AESO request failed with status {status}."
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| IngestError::TransportFailure(format!("Failed to parse AESO response: {e}")))?;

        debug!(url = %self.url, %status, "report received");
        Ok(body)
    }
}
