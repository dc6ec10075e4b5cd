//! The wallet provider contract, as described by
//! <https://github.com/ethereum/EIPs/blob/master/EIPS/eip-1193.md>.

use async_trait::async_trait;
use derive_more::Display;
use ethers::providers::JsonRpcError;
use serde::{Deserialize, Serialize};

/// User rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// The requested method and/or account has not been authorized by the user.
pub const UNAUTHORIZED: i64 = 4100;
/// The provider does not support the requested method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// The provider is disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;
/// The provider is not connected to the requested chain.
pub const CHAIN_DISCONNECTED: i64 = 4901;
/// Generic JSON RPC internal error, used when the provider rejects with something
/// that isn't a `ProviderRpcError`.
pub const INTERNAL_ERROR: i64 = -32603;

/// Callback invoked by the provider with the raw event payload.
pub type EventHandler = Box<dyn Fn(serde_json::Value) + 'static>;

/// Handle of a single listener registered through [`Provider::on`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display(fmt = "listener#{}", _0)]
pub struct ListenerId(pub u64);

/// Error raised by the provider, `ProviderRpcError` in EIP-1193 terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    pub fn is_unsupported_method(&self) -> bool {
        self.code == UNSUPPORTED_METHOD
    }

    pub fn is_disconnected(&self) -> bool {
        self.code == DISCONNECTED || self.code == CHAIN_DISCONNECTED
    }

    pub fn as_error_response(&self) -> JsonRpcError {
        JsonRpcError { code: self.code, message: self.message.clone(), data: self.data.clone() }
    }
}

impl From<JsonRpcError> for ProviderError {
    fn from(err: JsonRpcError) -> Self {
        Self { code: err.code, message: err.message, data: err.data }
    }
}

/// An EIP-1193 provider: request/response plus persistent event listeners.
///
/// Implementations make no promise about event ordering or delivery.
#[async_trait(?Send)]
pub trait Provider {
    /// Sends one request. `params` is omitted from the request object when `None`.
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Registers a listener that stays active until removed.
    fn on(&self, event: &str, handler: EventHandler) -> Result<ListenerId, ProviderError>;

    fn remove_listener(&self, event: &str, id: ListenerId) -> Result<(), ProviderError>;
}
