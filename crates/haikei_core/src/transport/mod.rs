//! Transports that carry a completion request to the endpoint
//!
//! This module provides:
//! - `http`: Direct HTTP calls from this process
//! - `bridge`: Calls delegated to a privileged host task
//!
//! The transport is picked once at startup and injected into the client.

mod bridge;
mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::error::Result;
use crate::model::CompletionRequest;

pub use bridge::{BridgeHandle, BridgeHost, BridgeStore, BridgeTransport};
pub use http::HttpTransport;

/// How completion requests leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// This process talks to the endpoint itself
    #[default]
    Direct,
    /// A privileged host performs the call on our behalf
    Bridged,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Bridged => "bridged",
        }
    }
}

/// Executes exactly one completion call per invocation
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Which path serves the request
    fn mode(&self) -> TransportMode;

    /// Send the request and return the first choice's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Build the transport for a mode
///
/// `Bridged` needs a handle to a running [`BridgeHost`]; the host itself
/// owns a direct transport built from the same [`HttpConfig`].
pub fn select_transport(
    mode: TransportMode,
    http: &HttpConfig,
    bridge: Option<BridgeHandle>,
) -> Result<Arc<dyn CompletionTransport>> {
    match (mode, bridge) {
        (TransportMode::Direct, _) => Ok(Arc::new(HttpTransport::new(http)?)),
        (TransportMode::Bridged, Some(handle)) => Ok(Arc::new(BridgeTransport::new(handle))),
        (TransportMode::Bridged, None) => Err(crate::error::CompletionError::Setup(
            "bridged mode requires a running bridge host".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_direct() {
        let transport =
            select_transport(TransportMode::Direct, &HttpConfig::default(), None).unwrap();
        assert_eq!(transport.mode(), TransportMode::Direct);
    }

    #[test]
    fn test_select_bridged_without_host() {
        let result = select_transport(TransportMode::Bridged, &HttpConfig::default(), None);
        assert!(matches!(result, Err(crate::error::CompletionError::Setup(_))));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(TransportMode::default(), TransportMode::Direct);
        assert_eq!(TransportMode::Bridged.as_str(), "bridged");
    }
}
