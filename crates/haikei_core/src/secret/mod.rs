//! Persistent storage for the API credential
//!
//! This module provides:
//! - `file`: JSON key-value file in the user's config directory
//! - `memory`: In-process key-value store
//! - `os_keyring`: OS credential vault
//!
//! The client only sees [`SecretStore`], a single named secret. Generic
//! key-value backends are adapted to it with [`KeyedSecret`].

mod file;
mod memory;
mod os_keyring;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SecretStoreError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use os_keyring::KeyringStore;

/// Key under which key-value backends keep the API key
pub const API_KEY_NAME: &str = "apiKey";
/// Service identifier for the OS credential vault
pub const KEYRING_SERVICE: &str = "haikei-ai";
/// Account identifier for the OS credential vault
pub const KEYRING_ACCOUNT: &str = "openai-api-key";

pub type StoreResult<T> = std::result::Result<T, SecretStoreError>;

/// A single named secret
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the secret; `None` when nothing is stored
    async fn get(&self) -> StoreResult<Option<String>>;

    /// Replace the secret
    async fn set(&self, secret: &str) -> StoreResult<()>;

    /// Remove the secret; removing a missing secret succeeds
    async fn delete(&self) -> StoreResult<()>;
}

/// Generic string key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    async fn clear(&self) -> StoreResult<()>;
}

/// A [`SecretStore`] backed by one key of a [`KeyValueStore`]
#[derive(Clone)]
pub struct KeyedSecret {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KeyedSecret {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Adapter for the API key entry
    pub fn api_key(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, API_KEY_NAME)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl SecretStore for KeyedSecret {
    async fn get(&self) -> StoreResult<Option<String>> {
        self.store.get(&self.key).await
    }

    async fn set(&self, secret: &str) -> StoreResult<()> {
        self.store.set(&self.key, secret).await
    }

    async fn delete(&self) -> StoreResult<()> {
        self.store.delete(&self.key).await
    }
}
