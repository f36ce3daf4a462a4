use std::{marker::PhantomData, sync::Arc, time::Duration};

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::{
        http::{reqwest::Url, Client, Http},
        Transport,
    },
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    config::PrivateKey,
    error::{BridgeError, InvokerError},
};

/// Chain access the bridge needs: read-only calls and signed submissions from
/// a single account.
#[async_trait]
pub trait ContractInvoker: Send + Sync {
    /// Account that signs submitted transactions.
    fn sender(&self) -> Address;

    /// `eth_call` against `to`, returning the raw return data.
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, InvokerError>;

    /// Signs and broadcasts a transaction. Gas, nonce and chain id are filled in
    /// by the implementation. Returns once the node accepted the transaction.
    async fn submit(&self, to: Address, calldata: Bytes, value: U256)
        -> Result<TxHash, InvokerError>;

    /// Waits until `tx_hash` is mined and fails if it reverted.
    async fn confirm(&self, tx_hash: TxHash) -> Result<(), InvokerError>;

    async fn native_balance(&self, owner: Address) -> Result<U256, InvokerError>;
}

#[async_trait]
impl<I: ContractInvoker + ?Sized> ContractInvoker for Arc<I> {
    fn sender(&self) -> Address {
        (**self).sender()
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, InvokerError> {
        (**self).call(to, calldata).await
    }

    async fn submit(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<TxHash, InvokerError> {
        (**self).submit(to, calldata, value).await
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<(), InvokerError> {
        (**self).confirm(tx_hash).await
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, InvokerError> {
        (**self).native_balance(owner).await
    }
}

/// [`ContractInvoker`] over an alloy provider with a wallet attached.
pub struct RpcInvoker<P, T> {
    provider: P,
    sender: Address,
    poll_interval: Duration,
    receipt_timeout: Duration,
    _phantom: PhantomData<T>,
}

impl<P, T> RpcInvoker<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    pub fn new(provider: P, sender: Address) -> Self {
        Self {
            provider,
            sender,
            poll_interval: Duration::from_millis(500),
            receipt_timeout: Duration::from_secs(180),
            _phantom: PhantomData,
        }
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }
}

#[async_trait]
impl<P, T> ContractInvoker for RpcInvoker<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    fn sender(&self) -> Address {
        self.sender
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, InvokerError> {
        let tx = TransactionRequest::default()
            .from(self.sender)
            .to(to)
            .input(calldata.into());
        Ok(self.provider.call(&tx).await?)
    }

    async fn submit(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<TxHash, InvokerError> {
        let tx = TransactionRequest::default()
            .from(self.sender)
            .to(to)
            .input(calldata.into())
            .value(value);
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, %to, %value, "transaction accepted by node");
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<(), InvokerError> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return if receipt.status() {
                    Ok(())
                } else {
                    Err(InvokerError::Rejected(format!("{tx_hash} reverted")))
                };
            }
            if started.elapsed() >= self.receipt_timeout {
                return Err(InvokerError::Rejected(format!(
                    "{tx_hash} not mined after {:?}",
                    self.receipt_timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, InvokerError> {
        Ok(self.provider.get_balance(owner).await?)
    }
}

/// Derives the account from `private_key`.
pub fn signer_from_key(private_key: &PrivateKey) -> Result<PrivateKeySigner, BridgeError> {
    private_key
        .expose()
        .trim()
        .parse::<PrivateKeySigner>()
        .map_err(|e| BridgeError::Credential(e.to_string()))
}

/// Connects to `rpc_url` with a wallet built from `private_key`.
pub fn connect(
    rpc_url: &str,
    private_key: &PrivateKey,
) -> Result<RpcInvoker<impl Provider<Http<Client>, Ethereum>, Http<Client>>, BridgeError> {
    let signer = signer_from_key(private_key)?;
    let sender = signer.address();
    let url: Url = rpc_url
        .parse()
        .map_err(|e| BridgeError::configuration(format!("invalid RPC URL {rpc_url}: {e}")))?;

    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    info!(%rpc_url, address = %sender, "connected signer");
    Ok(RpcInvoker::new(provider, sender))
}
