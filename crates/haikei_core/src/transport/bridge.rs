//! Bridged transport
//!
//! [`BridgeHost`] plays the privileged side: it owns the real transport and
//! the key-value store and serves requests arriving over a channel.
//! [`BridgeHandle`] is the caller's end. Results, including failures, come
//! back exactly as the host produced them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CompletionTransport, TransportMode};
use crate::assistant::Feature;
use crate::config::ClientConfig;
use crate::error::{CompletionError, Result, SecretStoreError};
use crate::model::CompletionRequest;
use crate::secret::{KeyValueStore, StoreResult, API_KEY_NAME};

const CHANNEL_CAPACITY: usize = 32;

/// Key-value operations forwarded to the host's store
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreOp {
    Get(String),
    Set(String, String),
    Delete(String),
    Clear,
}

impl StoreOp {
    fn name(&self) -> &'static str {
        match self {
            Self::Get(_) => "store.get",
            Self::Set(..) => "store.set",
            Self::Delete(_) => "store.delete",
            Self::Clear => "store.clear",
        }
    }
}

enum BridgeCall {
    Complete {
        request: CompletionRequest,
        reply: oneshot::Sender<Result<String>>,
    },
    Feature {
        feature: Feature,
        content: String,
        reply: oneshot::Sender<Result<String>>,
    },
    Store {
        op: StoreOp,
        reply: oneshot::Sender<StoreResult<Option<String>>>,
    },
}

impl BridgeCall {
    fn name(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Feature { feature, .. } => feature.name(),
            Self::Store { op, .. } => op.name(),
        }
    }
}

struct Envelope {
    id: Uuid,
    call: BridgeCall,
}

/// The privileged side of the bridge
#[derive(Clone)]
pub struct BridgeHost {
    transport: Arc<dyn CompletionTransport>,
    store: Arc<dyn KeyValueStore>,
    config: ClientConfig,
}

impl BridgeHost {
    /// Create a host around a transport and store
    ///
    /// `config` supplies model and temperature for the named feature calls;
    /// its key is ignored, the host reads the key from `store`.
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        store: Arc<dyn KeyValueStore>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    /// Start serving; the task ends when every handle is dropped
    pub fn spawn(self) -> (BridgeHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let host = self.clone();
                tokio::spawn(async move { host.serve(envelope).await });
            }
            debug!("Bridge host stopped");
        });

        (BridgeHandle { tx }, task)
    }

    async fn serve(&self, envelope: Envelope) {
        let Envelope { id, call } = envelope;
        debug!(%id, call = call.name(), "Bridge host serving call");

        // A closed reply channel means the caller went away; nothing to do
        match call {
            BridgeCall::Complete { request, reply } => {
                let result = self.transport.complete(&request).await;
                log_failure(id, &result);
                let _ = reply.send(result);
            }
            BridgeCall::Feature {
                feature,
                content,
                reply,
            } => {
                let result = self.run_feature(feature, content).await;
                log_failure(id, &result);
                let _ = reply.send(result);
            }
            BridgeCall::Store { op, reply } => {
                let _ = reply.send(self.apply(op).await);
            }
        }
    }

    async fn run_feature(&self, feature: Feature, content: String) -> Result<String> {
        let api_key = self
            .store
            .get(API_KEY_NAME)
            .await?
            .filter(|key| !key.trim().is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        let request = CompletionRequest {
            api_key,
            model: self.config.model.clone(),
            messages: feature.build_prompts(content),
            temperature: self.config.temperature,
        };
        self.transport.complete(&request).await
    }

    async fn apply(&self, op: StoreOp) -> StoreResult<Option<String>> {
        match op {
            StoreOp::Get(key) => self.store.get(&key).await,
            StoreOp::Set(key, value) => self.store.set(&key, &value).await.map(|_| None),
            StoreOp::Delete(key) => self.store.delete(&key).await.map(|_| None),
            StoreOp::Clear => self.store.clear().await.map(|_| None),
        }
    }
}

fn log_failure(id: Uuid, result: &Result<String>) {
    if let Err(e) = result {
        warn!(%id, error = %e, "Bridged completion failed");
    }
}

/// The caller's end of the bridge
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<Envelope>,
}

impl BridgeHandle {
    async fn dispatch<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> BridgeCall,
    ) -> std::result::Result<T, String> {
        let (reply, response) = oneshot::channel();
        let envelope = Envelope {
            id: Uuid::new_v4(),
            call: build(reply),
        };
        debug!(id = %envelope.id, call = envelope.call.name(), "Dispatching bridge call");

        self.tx
            .send(envelope)
            .await
            .map_err(|_| "bridge host is not running".to_string())?;
        response
            .await
            .map_err(|_| "bridge host dropped the call".to_string())
    }

    /// Run an arbitrary completion request on the host
    pub async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.dispatch(|reply| BridgeCall::Complete { request, reply })
            .await
            .map_err(CompletionError::Bridge)?
    }

    /// Summarize a mail using the host's stored key
    pub async fn summarize(&self, content: impl Into<String>) -> Result<String> {
        self.feature(Feature::Summarize, content.into()).await
    }

    /// Convert text to business style using the host's stored key
    pub async fn convert_style(&self, content: impl Into<String>) -> Result<String> {
        self.feature(Feature::ConvertStyle, content.into()).await
    }

    async fn feature(&self, feature: Feature, content: String) -> Result<String> {
        self.dispatch(|reply| BridgeCall::Feature {
            feature,
            content,
            reply,
        })
        .await
        .map_err(CompletionError::Bridge)?
    }

    async fn store(&self, op: StoreOp) -> StoreResult<Option<String>> {
        self.dispatch(|reply| BridgeCall::Store { op, reply })
            .await
            .map_err(SecretStoreError::Bridge)?
    }

    pub async fn store_get(&self, key: &str) -> StoreResult<Option<String>> {
        self.store(StoreOp::Get(key.to_string())).await
    }

    pub async fn store_set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.store(StoreOp::Set(key.to_string(), value.to_string()))
            .await
            .map(|_| ())
    }

    pub async fn store_delete(&self, key: &str) -> StoreResult<()> {
        self.store(StoreOp::Delete(key.to_string()))
            .await
            .map(|_| ())
    }

    pub async fn store_clear(&self) -> StoreResult<()> {
        self.store(StoreOp::Clear).await.map(|_| ())
    }
}

/// [`CompletionTransport`] that forwards every request over the bridge
#[derive(Clone)]
pub struct BridgeTransport {
    handle: BridgeHandle,
}

impl BridgeTransport {
    pub fn new(handle: BridgeHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl CompletionTransport for BridgeTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Bridged
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.handle.complete(request.clone()).await
    }
}

/// [`KeyValueStore`] living on the far side of the bridge
#[derive(Clone)]
pub struct BridgeStore {
    handle: BridgeHandle,
}

impl BridgeStore {
    pub fn new(handle: BridgeHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl KeyValueStore for BridgeStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.handle.store_get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.handle.store_set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.handle.store_delete(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.handle.store_clear().await
    }
}
