use crate::error::TransportError;
use async_trait::async_trait;

pub mod http;
pub mod relay;

pub use http::HttpTransport;
pub use relay::RelayTransport;

/// Status line of a direct HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStatus {
    pub code: u16,
    pub reason: String,
}

impl HttpStatus {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Raw body as delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub body: String,
    /// Present only for transports that speak HTTP to the source directly.
    pub status: Option<HttpStatus>,
}

impl RawDocument {
    /// A body handed over by a relay that already vouched for the retrieval.
    pub fn relayed(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status: None,
        }
    }
}

/// Trait defining how the raw feed document is obtained.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Retrieves the raw text of the remote document, or fails.
    async fn retrieve_document(&self) -> Result<RawDocument, TransportError>;
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_connect() {
        format!("could not connect: {}", err)
    } else {
        err.to_string()
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout_secs: u64) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout_secs)
    } else {
        TransportError::Connect(describe(&err))
    }
}
