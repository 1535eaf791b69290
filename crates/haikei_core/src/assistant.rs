//! Mail summary and style conversion on top of the completion client
//!
//! This is the catch site for failures: input is validated here, raw
//! failures are logged with their full detail, and callers receive an
//! [`AppError`] whose kind selects the fixed message to show.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{get_message, get_system_prompt, Language};
use crate::error::{create_app_error, AppError};
use crate::model::{ChatMessage, CompletionClient};

/// The two things this application does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Summarize,
    ConvertStyle,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::ConvertStyle => "convert_style",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        get_system_prompt(*self)
    }

    /// One system directive followed by the user's text
    pub fn build_prompts(&self, content: impl Into<String>) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(content),
        ]
    }

    /// Shown when the input box is empty
    pub fn empty_input_message(&self, lang: Language) -> &'static str {
        match self {
            Self::Summarize => get_message("summarize_empty_input", lang),
            Self::ConvertStyle => get_message("convert_empty_input", lang),
        }
    }

    pub fn title(&self, lang: Language) -> &'static str {
        match self {
            Self::Summarize => get_message("summarize_title", lang),
            Self::ConvertStyle => get_message("convert_title", lang),
        }
    }

    pub fn result_label(&self, lang: Language) -> &'static str {
        match self {
            Self::Summarize => get_message("summary_result", lang),
            Self::ConvertStyle => get_message("converted_result", lang),
        }
    }
}

/// Runs features against a shared [`CompletionClient`]
#[derive(Clone)]
pub struct Assistant {
    client: Arc<CompletionClient>,
}

impl Assistant {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Validate `input`, run `feature`, and normalize any failure
    ///
    /// Whitespace-only input never reaches the client.
    pub async fn run(&self, feature: Feature, input: &str) -> Result<String, AppError> {
        if input.trim().is_empty() {
            return Err(AppError::validation(format!(
                "{}: input text is empty",
                feature.name()
            )));
        }

        match self.client.generate_text(feature.build_prompts(input)).await {
            Ok(text) => {
                info!(feature = feature.name(), chars = text.chars().count(), "Feature completed");
                Ok(text)
            }
            Err(e) => {
                let app_error = create_app_error(&e);
                error!(
                    feature = feature.name(),
                    kind = ?app_error.kind,
                    error = %e,
                    "Feature failed"
                );
                Err(app_error)
            }
        }
    }

    pub async fn summarize(&self, mail: &str) -> Result<String, AppError> {
        self.run(Feature::Summarize, mail).await
    }

    pub async fn convert_style(&self, text: &str) -> Result<String, AppError> {
        self.run(Feature::ConvertStyle, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::{CompletionError, ErrorKind, Result};
    use crate::model::{CompletionRequest, Role};
    use crate::secret::{KeyedSecret, MemoryStore};
    use crate::transport::{CompletionTransport, TransportMode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        calls: AtomicUsize,
        reply: fn() -> Result<String>,
    }

    #[async_trait]
    impl CompletionTransport for Canned {
        fn mode(&self) -> TransportMode {
            TransportMode::Direct
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    fn assistant(api_key: &str, reply: fn() -> Result<String>) -> (Assistant, Arc<Canned>) {
        let transport = Arc::new(Canned {
            calls: AtomicUsize::new(0),
            reply,
        });
        let store = Arc::new(KeyedSecret::api_key(Arc::new(MemoryStore::new())));
        let client = CompletionClient::new(
            ClientConfig::default().with_api_key(api_key),
            transport.clone(),
            store,
        );
        (Assistant::new(Arc::new(client)), transport)
    }

    #[test]
    fn test_build_prompts() {
        let prompts = Feature::Summarize.build_prompts("本文です");
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].role, Role::System);
        assert_eq!(prompts[0].content, crate::config::SUMMARIZE_PROMPT);
        assert_eq!(prompts[1].role, Role::User);
        assert_eq!(prompts[1].content, "本文です");
    }

    #[test]
    fn test_feature_messages() {
        assert_eq!(
            Feature::Summarize.empty_input_message(Language::Japanese),
            "メール本文を入力してください"
        );
        assert_eq!(
            Feature::ConvertStyle.empty_input_message(Language::Japanese),
            "変換するテキストを入力してください"
        );
        assert_eq!(Feature::ConvertStyle.title(Language::English), "Style Conversion");
    }

    #[tokio::test]
    async fn test_blank_input_never_calls_client() {
        let (assistant, transport) = assistant("sk-test", || Ok("unused".to_string()));

        for input in ["", "   ", "\n\t "] {
            let err = assistant.summarize(input).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            let err = assistant.convert_style(input).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_passthrough() {
        let (assistant, transport) =
            assistant("sk-test", || Ok("Meeting request for 3pm tomorrow.".to_string()));

        let summary = assistant
            .summarize("Hello, let's meet tomorrow at 3pm.")
            .await
            .unwrap();
        assert_eq!(summary, "Meeting request for 3pm tomorrow.");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_api_failure_shows_fixed_message() {
        let (assistant, _) = assistant("sk-bad", || {
            Err(CompletionError::Api {
                status: 401,
                message: "Invalid API key".to_string(),
            })
        });

        let err = assistant.convert_style("明日伺います").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(
            err.message(Language::Japanese),
            "APIリクエストに失敗しました。APIキーを確認してください。"
        );
        assert!(err.detail.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_missing_key_is_api_kind() {
        let (assistant, transport) = assistant("", || Ok("unused".to_string()));

        let err = assistant.summarize("本文").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_network_failure() {
        let (assistant, _) = assistant("sk-test", || {
            Err(CompletionError::Network(
                "error sending request: dns error: failed to lookup address information".to_string(),
            ))
        });

        let err = assistant.summarize("本文").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
    }
}
