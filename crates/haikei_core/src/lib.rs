//! haikei_core: mail summary and business-style conversion
//!
//! This library provides:
//! - A completion client that owns the API key and model
//! - Direct HTTP and bridged transports behind one trait
//! - OS keyring, JSON file and in-memory secret stores
//! - A closed error taxonomy with fixed, localized messages
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use haikei_core::{
//!     Assistant, ClientConfig, CompletionClient, FileStore, HttpConfig, HttpTransport,
//!     KeyedSecret, Language,
//! };
//!
//! #[tokio::main]
//! async fn main() -> haikei_core::Result<()> {
//!     let store = Arc::new(KeyedSecret::api_key(Arc::new(FileStore::open_default()?)));
//!     let transport = Arc::new(HttpTransport::new(&HttpConfig::default())?);
//!     let client = CompletionClient::new(ClientConfig::default(), transport, store);
//!     client.reload().await?;
//!
//!     let assistant = Assistant::new(Arc::new(client));
//!     match assistant.summarize("明日の15時に打ち合わせをお願いします。").await {
//!         Ok(summary) => println!("{summary}"),
//!         Err(e) => eprintln!("{}", e.message(Language::Japanese)),
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Core functionality
pub mod assistant;
pub mod model;
pub mod secret;
pub mod transport;

// Re-export commonly used types and functions
pub use error::{
    create_app_error, get_error_message, AppError, CompletionError, ErrorKind, Result,
    SecretStoreError,
};

// Config re-exports
pub use config::{
    get_message, get_messages, get_system_prompt, mask_secret, ClientConfig, HttpConfig,
    Language, CONVERT_STYLE_PROMPT, MESSAGES_EN, MESSAGES_JA, SUMMARIZE_PROMPT,
};

// Model re-exports
pub use model::{ChatMessage, CompletionClient, CompletionRequest, Role};

// Transport re-exports
pub use transport::{
    select_transport, BridgeHandle, BridgeHost, BridgeStore, BridgeTransport,
    CompletionTransport, HttpTransport, TransportMode,
};

// Secret store re-exports
pub use secret::{
    FileStore, KeyValueStore, KeyedSecret, KeyringStore, MemoryStore, SecretStore, API_KEY_NAME,
    KEYRING_ACCOUNT, KEYRING_SERVICE,
};

// Assistant re-exports
pub use assistant::{Assistant, Feature};
