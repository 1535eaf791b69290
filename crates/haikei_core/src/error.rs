//! Error types and the user-facing error taxonomy
//!
//! Failures are raised as [`CompletionError`] with their kind fixed at the
//! point of origin. The front end turns them into an [`AppError`] exactly
//! once, at its catch site, and renders the fixed message for that kind.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::{get_message, Language};

/// Failures raised by the completion client, its transports and stores
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("API key is not set")]
    MissingApiKey,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("API returned no completion text")]
    EmptyResponse,

    #[error("Malformed API response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Bridge unavailable: {0}")]
    Bridge(String),

    #[error("Secret store error: {0}")]
    SecretStore(#[from] SecretStoreError),

    #[error("Client setup failed: {0}")]
    Setup(String),
}

/// Failures from the secret and key-value stores
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("No configuration directory available")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, CompletionError>;

/// The closed set of failure kinds shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Api,
    Validation,
    Network,
    Unknown,
}

impl ErrorKind {
    /// Message-table key for this kind
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Api => "api_error",
            Self::Validation => "validation_error",
            Self::Network => "network_error",
            Self::Unknown => "unknown_error",
        }
    }
}

/// A classified failure, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppError {
    pub kind: ErrorKind,
    /// Raw failure text, for logs only
    pub detail: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Input-validation failure raised directly by the caller
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, detail)
    }

    /// Fixed user-facing message for this error
    pub fn message(&self, lang: Language) -> &'static str {
        get_error_message(self, lang)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for AppError {}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        create_app_error(&err)
    }
}

/// Classify a failure into exactly one [`ErrorKind`]
pub fn create_app_error(err: &CompletionError) -> AppError {
    let kind = match err {
        CompletionError::MissingApiKey
        | CompletionError::Api { .. }
        | CompletionError::EmptyResponse
        | CompletionError::Decode(_)
        | CompletionError::SecretStore(_) => ErrorKind::Api,
        CompletionError::Network(_) | CompletionError::Timeout(_) => ErrorKind::Network,
        CompletionError::Validation(_) => ErrorKind::Validation,
        CompletionError::Bridge(_) | CompletionError::Setup(_) => ErrorKind::Unknown,
    };
    AppError::new(kind, err.to_string())
}

/// Render the fixed message for an error's kind
pub fn get_error_message(err: &AppError, lang: Language) -> &'static str {
    get_message(err.kind.message_key(), lang)
}
