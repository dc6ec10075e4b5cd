use ethers::types::U64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of `wallet_addEthereumChain`.
///
/// See <https://eips.ethereum.org/EIPS/eip-3085>
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// Serialized as a `0x`-prefixed hex quantity.
    pub chain_id: U64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

impl ChainDescriptor {
    pub fn from(
        chain_id: u64,
        chain_name: &str,
        rpc_urls: Vec<String>,
        block_explorer_urls: Vec<String>,
        native_currency: NativeCurrency,
    ) -> Self {
        Self {
            chain_id: U64::from(chain_id),
            chain_name: chain_name.to_string(),
            rpc_urls,
            block_explorer_urls,
            native_currency,
        }
    }

    /// The xDai chain, as registered by
    /// <https://www.xdaichain.com/for-users/wallets/metamask/metamask-setup>.
    /// MetaMask validates it against <https://chainid.network/chains.json>.
    pub fn xdai() -> Self {
        Self::from(
            100,
            "xDai Chain",
            vec!["https://rpc.xdaichain.com".to_string()],
            vec!["https://blockscout.com/xdai/mainnet".to_string()],
            NativeCurrency { name: "xDAI".to_string(), symbol: "xDAI".to_string(), decimals: 18 },
        )
    }
}
