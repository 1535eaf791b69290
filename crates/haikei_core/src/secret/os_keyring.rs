//! OS credential vault

use async_trait::async_trait;
use keyring::Entry;
use tracing::info;

use super::{SecretStore, StoreResult, KEYRING_ACCOUNT, KEYRING_SERVICE};
use crate::error::SecretStoreError;

/// Secret kept under a fixed service/account pair in the OS keyring
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    account: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
    }
}

impl KeyringStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    /// Whether a platform credential vault is compiled in
    ///
    /// Without one, `keyring` only has its per-`Entry` mock, which forgets a
    /// stored secret as soon as the `Entry` is dropped.
    pub const fn backend_available() -> bool {
        cfg!(feature = "native-keyring")
    }

    fn entry(service: &str, account: &str) -> StoreResult<Entry> {
        Entry::new(service, account)
            .map_err(|e| SecretStoreError::Keyring(format!("keyring entry error: {e}")))
    }

    // Keyring backends block; keep them off the async workers
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> StoreResult<T> + Send + 'static,
    {
        if !Self::backend_available() {
            return Err(SecretStoreError::Keyring(
                "no native keyring backend compiled in (build with the native-keyring feature)"
                    .to_string(),
            ));
        }
        let service = self.service.clone();
        let account = self.account.clone();
        tokio::task::spawn_blocking(move || op(Self::entry(&service, &account)?))
            .await
            .map_err(|e| SecretStoreError::Keyring(format!("keyring task failed: {e}")))?
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self) -> StoreResult<Option<String>> {
        self.run(|entry| match entry.get_password() {
            Ok(secret) if secret.is_empty() => Ok(None),
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretStoreError::Keyring(format!(
                "Failed to read API key: {e}"
            ))),
        })
        .await
    }

    async fn set(&self, secret: &str) -> StoreResult<()> {
        let secret = secret.to_string();
        self.run(move |entry| {
            entry
                .set_password(&secret)
                .map_err(|e| SecretStoreError::Keyring(format!("Failed to store API key: {e}")))
        })
        .await?;
        info!(service = %self.service, "API key stored in OS keyring");
        Ok(())
    }

    async fn delete(&self) -> StoreResult<()> {
        self.run(|entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretStoreError::Keyring(format!(
                "Failed to delete API key: {e}"
            ))),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "native-keyring"))]
    use crate::config::ClientConfig;
    #[cfg(not(feature = "native-keyring"))]
    use crate::model::{CompletionClient, CompletionRequest};
    #[cfg(not(feature = "native-keyring"))]
    use crate::transport::{CompletionTransport, TransportMode};
    #[cfg(not(feature = "native-keyring"))]
    use std::sync::Arc;

    #[cfg(not(feature = "native-keyring"))]
    struct Unreachable;

    #[cfg(not(feature = "native-keyring"))]
    #[async_trait]
    impl CompletionTransport for Unreachable {
        fn mode(&self) -> TransportMode {
            TransportMode::Direct
        }

        async fn complete(&self, _request: &CompletionRequest) -> crate::error::Result<String> {
            unreachable!("no request is sent in these tests")
        }
    }

    #[test]
    fn test_default_identifiers() {
        let store = KeyringStore::default();
        assert_eq!(store.service, "haikei-ai");
        assert_eq!(store.account, "openai-api-key");
    }

    #[cfg(not(feature = "native-keyring"))]
    #[tokio::test]
    async fn test_without_backend_every_call_fails() {
        assert!(!KeyringStore::backend_available());
        let store = KeyringStore::new("haikei-test", "no-backend");

        let err = store.set("sk-test-0123456789").await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Keyring(ref m) if m.contains("no native keyring")));
        assert!(matches!(store.get().await, Err(SecretStoreError::Keyring(_))));
        assert!(matches!(store.delete().await, Err(SecretStoreError::Keyring(_))));
    }

    #[cfg(not(feature = "native-keyring"))]
    #[tokio::test]
    async fn test_without_backend_set_key_is_not_reported_saved() {
        let client = CompletionClient::new(
            ClientConfig::default().with_api_key("sk-kept"),
            Arc::new(Unreachable),
            Arc::new(KeyringStore::new("haikei-test", "no-backend")),
        );

        assert!(client.set_api_key("sk-new-0123456789").await.is_err());
        assert!(client.has_api_key().await);
        assert!(client.reload().await.is_err());
    }

    // Talks to the real vault; run with --features native-keyring -- --ignored
    #[cfg(feature = "native-keyring")]
    #[tokio::test]
    #[ignore]
    async fn test_native_round_trip() {
        let store = KeyringStore::new("haikei-test", "round-trip");
        store.set("sk-test-0123456789").await.unwrap();
        assert_eq!(
            KeyringStore::new("haikei-test", "round-trip")
                .get()
                .await
                .unwrap()
                .as_deref(),
            Some("sk-test-0123456789")
        );
        store.delete().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
        store.delete().await.unwrap();
    }
}
