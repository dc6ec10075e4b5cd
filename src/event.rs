use derive_more::Display;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use super::{wallet::Wallet, Error};

/// Provider lifecycle events the bridge listens to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[display(fmt = "chainChanged")]
    #[serde(rename = "chainChanged")]
    ChainChanged,
    #[display(fmt = "accountsChanged")]
    #[serde(rename = "accountsChanged")]
    AccountsChanged,
    #[display(fmt = "disconnect")]
    #[serde(rename = "disconnect")]
    Disconnect,
}

impl EventKind {
    pub const ALL: [EventKind; 3] =
        [EventKind::ChainChanged, EventKind::AccountsChanged, EventKind::Disconnect];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChainChanged => "chainChanged",
            Self::AccountsChanged => "accountsChanged",
            Self::Disconnect => "disconnect",
        }
    }
}

/// An event together with its decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// New chain id as sent, usually hex encoded. Only the firing matters.
    ChainChanged(serde_json::Value),
    AccountsChanged(Vec<Address>),
    /// Whatever the provider passed along, usually a `ProviderRpcError`.
    Disconnect(serde_json::Value),
}

impl ProviderEvent {
    pub fn from_payload(kind: EventKind, payload: serde_json::Value) -> Result<Self, Error> {
        Ok(match kind {
            EventKind::ChainChanged => Self::ChainChanged(payload),
            EventKind::AccountsChanged => Self::AccountsChanged(serde_json::from_value(payload)?),
            EventKind::Disconnect => Self::Disconnect(payload),
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::ChainChanged(_) => EventKind::ChainChanged,
            Self::AccountsChanged(_) => EventKind::AccountsChanged,
            Self::Disconnect(_) => EventKind::Disconnect,
        }
    }
}

/// One delivery of the event bridge.
///
/// `sequence` grows with every event fired on a subscription, in firing order.
/// Reports may arrive out of that order.
#[derive(Debug)]
pub struct Report {
    pub sequence: u64,
    pub event: EventKind,
    /// `Ok(None)` when there is no connected account.
    pub outcome: Result<Option<Wallet>, Error>,
}

impl Report {
    pub fn wallet(&self) -> Option<&Wallet> {
        self.outcome.as_ref().ok().and_then(Option::as_ref)
    }
}
