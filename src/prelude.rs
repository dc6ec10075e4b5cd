pub use crate::{
    bridge::{latest_only, Subscription},
    chain::{ChainDescriptor, NativeCurrency},
    event::{EventKind, ProviderEvent, Report},
    provider::{Provider, ProviderError},
    wallet::Wallet,
    Error, MetaMask,
};

#[cfg(target_arch = "wasm32")]
pub use crate::injected::{InjectedProvider, WasmSpawner};
