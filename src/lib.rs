pub mod bridge;
pub mod chain;
pub mod event;
#[cfg(target_arch = "wasm32")]
pub mod injected;
pub mod prelude;
pub mod provider;
pub mod rpc;
pub mod wallet;

#[cfg(test)]
mod mock;

use std::{cell::Cell, rc::Rc};

use ethers::types::{Address, TxHash};
use futures::task::{LocalSpawn, SpawnError};
use serde::{de::DeserializeOwned, Serialize};

use self::{
    bridge::Subscription,
    chain::ChainDescriptor,
    event::Report,
    provider::{Provider, ProviderError},
    wallet::Wallet,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Provider(ProviderError),

    #[error("Bad response")]
    BadResponse,

    #[error("Already listening to wallet events")]
    AlreadyListening,

    #[error("No injected wallet provider")]
    NoProvider,

    #[error(transparent)]
    CorruptedPacket(#[from] serde_json::error::Error),

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

/// Client of an injected wallet provider.
///
/// Clones share the provider and the event registration.
pub struct MetaMask<P: Provider> {
    provider: Rc<P>,
    spawner: Rc<dyn LocalSpawn>,
    listening: Rc<Cell<bool>>,
}

impl<P: Provider> Clone for MetaMask<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            spawner: self.spawner.clone(),
            listening: self.listening.clone(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl MetaMask<injected::InjectedProvider> {
    /// Connects to `window.ethereum`, running event resolutions on the browser's event loop.
    pub fn injected() -> Result<Self, Error> {
        Ok(Self::new(injected::InjectedProvider::from_window()?, injected::WasmSpawner))
    }
}

impl<P: Provider + 'static> MetaMask<P> {
    pub fn new(provider: P, spawner: impl LocalSpawn + 'static) -> Self {
        Self {
            provider: Rc::new(provider),
            spawner: Rc::new(spawner),
            listening: Rc::new(Cell::new(false)),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }

    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<R, Error> {
        rpc::request(self.provider.as_ref(), method, params).await
    }

    pub async fn get_accounts(&self) -> Result<Vec<Address>, Error> {
        rpc::get_accounts(self.provider.as_ref()).await
    }

    /// Prompts the user for authorization if the site hasn't got it yet.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, Error> {
        rpc::request_accounts(self.provider.as_ref()).await
    }

    pub async fn send_transaction<T: Serialize + ?Sized>(
        &self,
        transaction: &T,
    ) -> Result<TxHash, Error> {
        rpc::send_transaction(self.provider.as_ref(), transaction).await
    }

    pub async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), Error> {
        rpc::add_chain(self.provider.as_ref(), chain).await
    }

    pub async fn xdai_import(&self) -> Result<(), Error> {
        rpc::xdai_import(self.provider.as_ref()).await
    }

    pub async fn get_wallet(&self, address: Address) -> Result<Wallet, Error> {
        rpc::get_wallet(self.provider.as_ref(), address).await
    }

    /// Listens to `chainChanged`, `accountsChanged` and `disconnect`, reporting the
    /// resolved wallet for every event fired.
    ///
    /// Only one subscription may be active per client; a second call fails with
    /// [`Error::AlreadyListening`] until the first one is unsubscribed.
    pub fn handle_wallet_events<F>(&self, port: F) -> Result<Subscription<P>, Error>
    where
        F: Fn(Report) + 'static,
    {
        bridge::register(&self.provider, &self.spawner, &self.listening, Rc::new(port))
    }
}
