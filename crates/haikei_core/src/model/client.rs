//! Configured completion client

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{mask_secret, ClientConfig};
use crate::error::{CompletionError, Result};
use crate::model::{ChatMessage, CompletionRequest};
use crate::secret::SecretStore;
use crate::transport::{CompletionTransport, TransportMode};

/// Single point of contact with the completion endpoint
///
/// Owns the credential and model for the life of the process. The transport
/// and secret store are injected, so the same client serves direct and
/// bridged setups and can be exercised with fakes.
pub struct CompletionClient {
    config: RwLock<ClientConfig>,
    transport: Arc<dyn CompletionTransport>,
    store: Arc<dyn SecretStore>,
}

impl CompletionClient {
    /// Create a client; performs no I/O
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn CompletionTransport>,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            transport,
            store,
        }
    }

    /// Re-read the API key from the secret store
    pub async fn reload(&self) -> Result<()> {
        let stored = self.store.get().await?;
        let mut config = self.config.write().await;
        match stored {
            Some(key) => {
                debug!(key = %mask_secret(&key), "Loaded API key from secret store");
                config.api_key = key;
            }
            None => {
                debug!("No API key in secret store");
                config.api_key.clear();
            }
        }
        Ok(())
    }

    /// Persist a new API key, then make it active
    ///
    /// If the store rejects the write, the previous key stays active.
    pub async fn set_api_key(&self, key: &str) -> Result<()> {
        if let Err(e) = self.store.set(key).await {
            warn!(error = %e, "Failed to store API key");
            return Err(e.into());
        }
        self.config.write().await.api_key = key.to_string();
        info!(key = %mask_secret(key), "API key updated");
        Ok(())
    }

    /// Remove the API key from the store and from memory
    pub async fn delete_api_key(&self) -> Result<()> {
        self.store.delete().await?;
        self.config.write().await.api_key.clear();
        info!("API key deleted");
        Ok(())
    }

    /// Masked form of the active key, for display
    pub async fn api_key_preview(&self) -> Option<String> {
        let config = self.config.read().await;
        config
            .has_api_key()
            .then(|| mask_secret(&config.api_key))
    }

    pub async fn has_api_key(&self) -> bool {
        self.config.read().await.has_api_key()
    }

    pub async fn model(&self) -> String {
        self.config.read().await.model.clone()
    }

    pub fn transport_mode(&self) -> TransportMode {
        self.transport.mode()
    }

    /// Send `prompts` and return the first completion's text verbatim
    ///
    /// Fails with [`CompletionError::MissingApiKey`] before any I/O when no
    /// key is set. Issues at most one request; never retries.
    pub async fn generate_text(&self, prompts: Vec<ChatMessage>) -> Result<String> {
        let request = {
            let config = self.config.read().await;
            if !config.has_api_key() {
                return Err(CompletionError::MissingApiKey);
            }
            CompletionRequest {
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                messages: prompts,
                temperature: config.temperature,
            }
        };

        debug!(
            mode = self.transport.mode().as_str(),
            model = %request.model,
            "Generating text"
        );
        self.transport.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecretStoreError;
    use crate::secret::{KeyedSecret, MemoryStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl Recording {
        fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionTransport for Recording {
        fn mode(&self) -> TransportMode {
            TransportMode::Direct
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("ok".to_string())
        }
    }

    /// Reads succeed, writes fail
    struct ReadOnlyStore;

    #[async_trait]
    impl SecretStore for ReadOnlyStore {
        async fn get(&self) -> StoreResult<Option<String>> {
            Ok(Some("sk-original".to_string()))
        }

        async fn set(&self, _secret: &str) -> StoreResult<()> {
            Err(SecretStoreError::Keyring("vault is locked".to_string()))
        }

        async fn delete(&self) -> StoreResult<()> {
            Err(SecretStoreError::Keyring("vault is locked".to_string()))
        }
    }

    fn memory_secret() -> Arc<KeyedSecret> {
        Arc::new(KeyedSecret::api_key(Arc::new(MemoryStore::new())))
    }

    fn prompts() -> Vec<ChatMessage> {
        vec![ChatMessage::system("summarize"), ChatMessage::user("hello")]
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_io() {
        let transport = Arc::new(Recording::default());
        let client = CompletionClient::new(
            ClientConfig::default(),
            transport.clone(),
            memory_secret(),
        );

        let err = client.generate_text(prompts()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
        assert_eq!(transport.count(), 0);

        client.set_api_key("  ").await.unwrap();
        let err = client.generate_text(prompts()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_config() {
        let transport = Arc::new(Recording::default());
        let client = CompletionClient::new(
            ClientConfig::new("gpt-4o-mini").with_api_key("sk-test"),
            transport.clone(),
            memory_secret(),
        );

        assert_eq!(client.generate_text(prompts()).await.unwrap(), "ok");

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].api_key, "sk-test");
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].messages, prompts());
    }

    #[tokio::test]
    async fn test_set_key_then_reload_round_trip() {
        let backing = Arc::new(MemoryStore::new());
        let store = Arc::new(KeyedSecret::api_key(backing.clone()));
        let client = CompletionClient::new(
            ClientConfig::default(),
            Arc::new(Recording::default()),
            store.clone(),
        );
        client.set_api_key("sk-round-trip").await.unwrap();

        // A second client over the same store sees the key after reload
        let fresh = CompletionClient::new(
            ClientConfig::default(),
            Arc::new(Recording::default()),
            store,
        );
        assert!(!fresh.has_api_key().await);
        fresh.reload().await.unwrap();
        assert_eq!(fresh.config.read().await.api_key, "sk-round-trip");
    }

    #[tokio::test]
    async fn test_store_failure_keeps_previous_key() {
        let client = CompletionClient::new(
            ClientConfig::default(),
            Arc::new(Recording::default()),
            Arc::new(ReadOnlyStore),
        );
        client.reload().await.unwrap();

        let err = client.set_api_key("sk-new").await.unwrap_err();
        assert!(matches!(err, CompletionError::SecretStore(_)));
        assert_eq!(client.config.read().await.api_key, "sk-original");

        assert!(client.delete_api_key().await.is_err());
        assert!(client.has_api_key().await);
    }

    #[tokio::test]
    async fn test_delete_and_reload_clear_key() {
        let store = memory_secret();
        let client = CompletionClient::new(
            ClientConfig::default().with_api_key("sk-in-memory"),
            Arc::new(Recording::default()),
            store,
        );

        // Nothing stored yet, so reload clears the in-memory key
        client.reload().await.unwrap();
        assert!(!client.has_api_key().await);

        client.set_api_key("sk-abcdefghijkl").await.unwrap();
        assert_eq!(client.api_key_preview().await.as_deref(), Some("sk-a…ijkl"));

        client.delete_api_key().await.unwrap();
        assert!(client.api_key_preview().await.is_none());
        client.reload().await.unwrap();
        assert!(!client.has_api_key().await);
    }

    #[tokio::test]
    async fn test_accessors() {
        let client = CompletionClient::new(
            ClientConfig::new("gpt-4o"),
            Arc::new(Recording::default()),
            memory_secret(),
        );
        assert_eq!(client.model().await, "gpt-4o");
        assert_eq!(client.transport_mode(), TransportMode::Direct);
    }
}
