//! One-shot provider requests. Each function issues exactly one request and hands
//! back what the provider answered; provider failures are passed through untouched
//! inside [`Error::Provider`].

use ethers::types::{Address, TxHash};
use log::debug;
use serde::{de::DeserializeOwned, Serialize};

use super::{chain::ChainDescriptor, provider::Provider, wallet::Wallet, Error};

/// <https://eth.wiki/json-rpc/API#eth_accounts>
pub const METHOD_ACCOUNTS: &str = "eth_accounts";
/// <https://docs.metamask.io/guide/rpc-api.html#eth-requestaccounts>
pub const METHOD_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const METHOD_SEND_TRANSACTION: &str = "eth_sendTransaction";
/// <https://docs.metamask.io/guide/rpc-api.html#wallet-addethereumchain>
pub const METHOD_ADD_ETHEREUM_CHAIN: &str = "wallet_addEthereumChain";
pub const METHOD_NET_VERSION: &str = "net_version";

/// Sends `method` and decodes the result into `R`.
pub async fn request<P, R>(
    provider: &P,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<R, Error>
where
    P: Provider + ?Sized,
    R: DeserializeOwned,
{
    debug!("request {method}");
    let value = provider.request(method, params).await.map_err(Error::Provider)?;
    Ok(serde_json::from_value(value)?)
}

pub async fn get_accounts<P: Provider + ?Sized>(provider: &P) -> Result<Vec<Address>, Error> {
    request(provider, METHOD_ACCOUNTS, None).await
}

pub async fn request_accounts<P: Provider + ?Sized>(provider: &P) -> Result<Vec<Address>, Error> {
    request(provider, METHOD_REQUEST_ACCOUNTS, None).await
}

/// The transaction object is forwarded as-is; filling and signing are up to the wallet.
pub async fn send_transaction<P, T>(provider: &P, transaction: &T) -> Result<TxHash, Error>
where
    P: Provider + ?Sized,
    T: Serialize + ?Sized,
{
    let params = serde_json::Value::Array(vec![serde_json::to_value(transaction)?]);
    request(provider, METHOD_SEND_TRANSACTION, Some(params)).await
}

pub async fn add_chain<P: Provider + ?Sized>(
    provider: &P,
    chain: &ChainDescriptor,
) -> Result<(), Error> {
    let params = serde_json::Value::Array(vec![serde_json::to_value(chain)?]);
    // `null` on success, anything else is ignored
    let _: serde_json::Value = request(provider, METHOD_ADD_ETHEREUM_CHAIN, Some(params)).await?;
    Ok(())
}

pub async fn xdai_import<P: Provider + ?Sized>(provider: &P) -> Result<(), Error> {
    add_chain(provider, &ChainDescriptor::xdai()).await
}

/// Pairs `address` with the network the provider is currently on.
pub async fn get_wallet<P: Provider + ?Sized>(
    provider: &P,
    address: Address,
) -> Result<Wallet, Error> {
    let network: serde_json::Value = request(provider, METHOD_NET_VERSION, None).await?;
    let network = match network {
        serde_json::Value::String(network) => network,
        serde_json::Value::Number(network) => network.to_string(),
        _ => return Err(Error::BadResponse),
    };

    Ok(Wallet { address, network })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mock::MockProvider, provider::ProviderError};
    use ethers::types::H256;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn get_accounts_may_be_empty() {
        let provider = MockProvider::new();
        provider.respond(METHOD_ACCOUNTS, Ok(json!([])));

        assert_eq!(block_on(get_accounts(&provider)).unwrap(), Vec::<Address>::new());
        assert_eq!(provider.requests(), vec![(METHOD_ACCOUNTS.to_string(), None)]);
    }

    #[test]
    fn request_accounts_passes_rejection_through() {
        let provider = MockProvider::new();
        let rejection = ProviderError::new(4001, "User rejected the request.");
        provider.respond(METHOD_REQUEST_ACCOUNTS, Err(rejection.clone()));

        match block_on(request_accounts(&provider)) {
            Err(Error::Provider(err)) => assert_eq!(err, rejection),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn send_transaction_wraps_transaction_in_params() {
        let provider = MockProvider::new();
        let hash = H256::repeat_byte(0xab);
        provider.respond(METHOD_SEND_TRANSACTION, Ok(serde_json::to_value(hash).unwrap()));

        let tx = json!({"from": "0x1111111111111111111111111111111111111111", "value": "0x0"});
        assert_eq!(block_on(send_transaction(&provider, &tx)).unwrap(), hash);
        assert_eq!(
            provider.requests(),
            vec![(METHOD_SEND_TRANSACTION.to_string(), Some(json!([tx])))]
        );
    }

    #[test]
    fn xdai_import_adds_chain_0x64() {
        let provider = MockProvider::new();
        provider.respond(METHOD_ADD_ETHEREUM_CHAIN, Ok(serde_json::Value::Null));

        block_on(xdai_import(&provider)).unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let (method, params) = &requests[0];
        assert_eq!(method, METHOD_ADD_ETHEREUM_CHAIN);
        let params = params.as_ref().and_then(|p| p.as_array()).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["chainId"], json!("0x64"));
    }

    #[test]
    fn get_wallet_accepts_numeric_net_version() {
        let provider = MockProvider::new();
        let address = Address::repeat_byte(0x22);
        provider.respond(METHOD_NET_VERSION, Ok(json!("100")));
        provider.respond(METHOD_NET_VERSION, Ok(json!(1)));
        provider.respond(METHOD_NET_VERSION, Ok(json!({"network": 1})));

        assert_eq!(block_on(get_wallet(&provider, address)).unwrap(), Wallet::new(address, "100"));
        assert_eq!(block_on(get_wallet(&provider, address)).unwrap(), Wallet::new(address, "1"));
        assert!(matches!(block_on(get_wallet(&provider, address)), Err(Error::BadResponse)));
    }
}
