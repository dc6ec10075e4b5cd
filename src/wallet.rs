use std::fmt::Display;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Wallet state resolved from the provider: the selected account and the network it is on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wallet {
    pub address: Address,
    /// `net_version` as reported by the provider.
    pub network: String,
}

impl Wallet {
    pub fn new(address: Address, network: impl Into<String>) -> Self {
        Self { address, network: network.into() }
    }
}

impl Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}", self.address, self.network)
    }
}
