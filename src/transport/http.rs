use super::{map_reqwest_error, HttpStatus, RawDocument, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Direct GET of the feed URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn retrieve_document(&self) -> Result<RawDocument, TransportError> {
        debug!(url = %self.url, "GET prompt feed");
        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout_secs))?;

        let status = response.status();
        let status = HttpStatus {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        };
        let body = response.text().await.map_err(|e| map_reqwest_error(e, timeout_secs))?;

        Ok(RawDocument {
            body,
            status: Some(status),
        })
    }
}
