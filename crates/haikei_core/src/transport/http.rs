//! Direct HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{CompletionTransport, TransportMode};
use crate::config::HttpConfig;
use crate::error::{CompletionError, Result};
use crate::model::{ApiErrorBody, ChatCompletionResponse, CompletionRequest};

/// Posts chat completion requests straight to the endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport bounded by `config.timeout`
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            url: config.completions_url(),
            timeout: config.timeout,
        })
    }

    /// Endpoint URL this transport posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_send_error(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(self.timeout)
        } else if err.is_decode() {
            CompletionError::Decode(err.to_string())
        } else {
            CompletionError::Network(error_chain(&err))
        }
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Direct
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(
            url = %self.url,
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&request.api_key)
            .header("Content-Type", "application/json")
            .json(&request.body())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = ApiErrorBody::message_from(&text)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "Chat completion rejected");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Decode(e.to_string()))?;

        parsed
            .into_first_content()
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// reqwest hides the root cause (e.g. DNS failure) in its source chain
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_url() {
        let transport = HttpTransport::new(&HttpConfig::new("http://localhost:9999/v1")).unwrap();
        assert_eq!(transport.url(), "http://localhost:9999/v1/chat/completions");
        assert_eq!(transport.mode(), TransportMode::Direct);
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "failed to lookup address");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, inner);
        assert!(error_chain(&outer).contains("failed to lookup address"));
    }
}
