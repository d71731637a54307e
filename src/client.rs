use crate::error::{FetchError, TransportError};
use crate::ingest::{classify, normalize, preprocess, BlockReason};
use crate::models::PromptCollection;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_SOURCE_URL: &str = "https://viralprompts.in/data.json";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Runs single fetch attempts: transport, then classify, parse and
/// normalize. Retries are the coordinator's business.
#[derive(Clone)]
pub struct PromptClient {
    transport: Arc<dyn Transport>,
    options: ClientOptions,
}

impl PromptClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_options(transport, ClientOptions::default())
    }

    pub fn with_options(transport: Arc<dyn Transport>, options: ClientOptions) -> Self {
        Self { transport, options }
    }

    #[instrument(skip(self), fields(transport = self.transport.name()))]
    pub async fn fetch_and_validate(&self) -> Result<PromptCollection, FetchError> {
        let retrieval =
            tokio::time::timeout(self.options.timeout, self.transport.retrieve_document());
        let document = match retrieval.await {
            Ok(Ok(document)) => document,
            Ok(Err(err)) => {
                error!(error = %err, "Transport failed");
                return Err(err.into());
            }
            Err(_) => {
                error!(timeout_secs = self.options.timeout.as_secs(), "Fetch timed out");
                return Err(FetchError::network(format!(
                    "Request timeout: {}",
                    TransportError::Timeout(self.options.timeout.as_secs())
                )));
            }
        };

        if let Some(status) = document.status.as_ref().filter(|s| !s.is_success()) {
            error!(status = status.code, "Fetch failed with HTTP error");
            return Err(FetchError::http(
                status.code,
                format!("Failed to fetch prompts: HTTP {}: {}", status.code, status.reason),
            ));
        }

        let text = preprocess(&document.body);
        debug!(bytes = text.len(), "Preprocessed response body");

        let classification = classify(&text);
        if !classification.is_json_like {
            warn!(reason = ?classification.block_reason, "Response is not JSON");
            return Err(FetchError::blocked(blocked_message(classification.block_reason)));
        }

        let parsed: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "JSON parse error");
            FetchError::parse(format!("Failed to parse JSON response: {}", e))
        })?;

        let collection = normalize(&parsed)?;
        debug!(count = collection.len(), "Fetched prompt feed");
        Ok(collection)
    }
}

fn blocked_message(reason: BlockReason) -> &'static str {
    match reason {
        BlockReason::ProtectionBlock => {
            "The prompt source is behind a protection service that blocked the request"
        }
        BlockReason::AccessDenied => "Access to the prompt source was denied",
        BlockReason::GenericNonJson | BlockReason::None => {
            "The prompt source returned a non-JSON response (likely an error or maintenance page)"
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use crate::transport::{HttpStatus, RawDocument};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport double that replays a script of outcomes, repeating the last.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<RawDocument, String>>>,
        delay: Duration,
        pub(crate) calls: Mutex<usize>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<RawDocument, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                delay: Duration::ZERO,
                calls: Mutex::new(0),
            }
        }

        pub(crate) fn body(body: &str) -> Self {
            Self::new(vec![Ok(RawDocument::relayed(body))])
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn retrieve_document(&self) -> Result<RawDocument, TransportError> {
            *self.calls.lock().unwrap() += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            match next.expect("script is never empty") {
                Ok(doc) => Ok(doc),
                Err(msg) => Err(TransportError::Connect(msg)),
            }
        }
    }

    fn client_for(transport: ScriptedTransport) -> PromptClient {
        PromptClient::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn valid_feed() {
        let client = client_for(ScriptedTransport::body(
            r#"{"prompts":[{"title":"T","prompt":"P","urlTitle":"t","id":1}]}"#,
        ));
        let collection = client.fetch_and_validate().await.unwrap();
        assert_eq!(collection.prompts.len(), 1);
        assert_eq!(collection.prompts[0].title, "T");
        assert_eq!(collection.prompts[0].id, 1.0);
    }

    #[tokio::test]
    async fn bom_prefixed_feed_parses() {
        let client = client_for(ScriptedTransport::body(
            concat!(
                "\u{feff}\n ",
                r#"{"prompts":[{"title":"T","prompt":"P","urlTitle":"t","id":"7"}]}"#
            ),
        ));
        let collection = client.fetch_and_validate().await.unwrap();
        assert_eq!(collection.prompts[0].id, 7.0);
        assert_eq!(collection.prompts[0].copied_count, None);
    }

    #[tokio::test]
    async fn html_block_page_is_blocked() {
        let client = client_for(ScriptedTransport::body(
            "<html><head></head><body>blocked by cloudflare</body></html>",
        ));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Blocked);
    }

    #[tokio::test]
    async fn generic_error_page_is_blocked() {
        let client = client_for(ScriptedTransport::body("<!DOCTYPE html><p>Maintenance</p>"));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Blocked);
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let client = client_for(ScriptedTransport::body("{\"prompts\": [}"));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Parse);
    }

    #[tokio::test]
    async fn overflowing_numbers_only_affect_their_record() {
        let client = client_for(ScriptedTransport::body(
            r#"{"prompts":[
                {"title":"A","prompt":"a","urlTitle":"a","id":1e400},
                {"title":"B","prompt":"b","urlTitle":"b","id":2,"copiedCount":1e400},
                {"title":"C","prompt":"c","urlTitle":"c","id":3,"copiedCount":-1e400}
            ]}"#,
        ));
        let collection = client.fetch_and_validate().await.unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.prompts[0].url_title, "b");
        assert_eq!(collection.prompts[0].id, 2.0);
        assert_eq!(collection.prompts[0].copied_count, None);
        assert_eq!(collection.prompts[1].url_title, "c");
        assert_eq!(collection.prompts[1].copied_count, None);
    }

    #[tokio::test]
    async fn empty_feed_is_validation_error() {
        let client = client_for(ScriptedTransport::body(r#"{"prompts":[]}"#));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Validation);
        assert!(err.message.contains("No valid prompts"));
    }

    #[tokio::test]
    async fn wrong_envelope_is_validation_error() {
        let client = client_for(ScriptedTransport::body(r#"[{"title":"T"}]"#));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Validation);
    }

    #[tokio::test]
    async fn http_status_is_checked_for_http_transports() {
        let client = client_for(ScriptedTransport::new(vec![Ok(RawDocument {
            body: r#"{"prompts":[{"title":"T","prompt":"P","urlTitle":"t","id":1}]}"#.to_string(),
            status: Some(HttpStatus {
                code: 503,
                reason: "Service Unavailable".to_string(),
            }),
        })]));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Http);
        assert_eq!(err.status_code, Some(503));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let client = client_for(ScriptedTransport::new(vec![Err("connection refused".into())]));
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_transport_times_out() {
        let transport =
            ScriptedTransport::body(r#"{"prompts":[]}"#).with_delay(Duration::from_secs(60));
        let client = PromptClient::with_options(
            Arc::new(transport),
            ClientOptions {
                timeout: Duration::from_secs(15),
            },
        );
        let err = client.fetch_and_validate().await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);
        assert!(err.message.contains("timeout"));
    }
}
