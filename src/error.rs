use std::fmt;
use thiserror::Error;

/// Why a fetch attempt failed, as reported to the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Transport fault, connectivity loss or timeout.
    Network,
    /// Non-success status from a direct HTTP transport.
    Http,
    /// Body looked like JSON but did not parse.
    Parse,
    /// Parsed JSON with the wrong shape, or no usable records.
    Validation,
    /// Body was not JSON at all (block page, error page, maintenance page).
    Blocked,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Network => "network",
            FetchErrorKind::Http => "http",
            FetchErrorKind::Parse => "parse",
            FetchErrorKind::Validation => "validation",
            FetchErrorKind::Blocked => "blocked",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only error that leaves the fetch orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Http,
            status_code: Some(status_code),
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Parse, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Validation, message)
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Blocked, message)
    }

    /// Short text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self.kind {
            FetchErrorKind::Network => {
                "Could not reach the prompt server. Check your connection and try again.".into()
            }
            FetchErrorKind::Http => match self.status_code {
                Some(code) => format!("The prompt server responded with HTTP {}.", code),
                None => "The prompt server responded with an error.".to_string(),
            },
            FetchErrorKind::Parse => "The prompt data could not be read.".to_string(),
            FetchErrorKind::Validation => {
                "The prompt data was not in the expected format.".to_string()
            }
            FetchErrorKind::Blocked => {
                "The prompt source is unavailable or blocked the request. Try again later.".into()
            }
        }
    }
}

/// Failure reported by a transport before any body is available.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("relay could not retrieve the document: {0}")]
    Relay(String),
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        FetchError::network(format!("Network error: {}", err))
    }
}

/// Envelope-level failures from the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Invalid JSON structure: expected top-level object with \"prompts\" array")]
    InvalidEnvelope,

    #[error("No valid prompts found in response ({total} records, all rejected)")]
    NoValidRecords { total: usize },
}

impl From<NormalizeError> for FetchError {
    fn from(err: NormalizeError) -> Self {
        FetchError::validation(err.to_string())
    }
}
