use super::{map_reqwest_error, RawDocument, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Path served by [`crate::relay`].
pub const RELAY_DOCUMENT_PATH: &str = "/relay/document";

/// Fetches the feed through a relay that performs the upstream request.
///
/// The relay answers 200 with the upstream body or an error status with a
/// plain-text reason. Either way the upstream status never reaches the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl RelayTransport {
    pub fn new(relay_base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", relay_base_url.trim_end_matches('/'), RELAY_DOCUMENT_PATH),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for RelayTransport {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn retrieve_document(&self) -> Result<RawDocument, TransportError> {
        debug!(endpoint = %self.endpoint, "Requesting prompt feed via relay");
        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout_secs))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| map_reqwest_error(e, timeout_secs))?;

        if !status.is_success() {
            let reason = if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            };
            return Err(TransportError::Relay(reason));
        }

        Ok(RawDocument::relayed(body))
    }
}
