//! The bridge sequence: pool selection, approval, fee quote, value and submission.

use std::fmt;

use alloy::{
    primitives::{Address, TxHash, U256},
    sol_types::SolCall,
};
use tracing::{info, info_span, instrument::WithSubscriber, warn, Dispatch, Instrument};

use crate::{
    approval,
    bindings::IStargate,
    error::{BridgeError, InvokerError},
    invoker::ContractInvoker,
    params::{BridgeParameters, FeeQuote, Slippage},
    quote,
    registry::{ChainDescriptor, Registry},
    token::TokenKind,
};

/// One requested transfer, resolved against the registry.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source: ChainDescriptor,
    pub destination: ChainDescriptor,
    pub token_kind: TokenKind,
    pub token_address: Address,
    pub amount: U256,
    pub sender: Address,
    pub recipient: Address,
}

impl TransferRequest {
    /// Resolves both chains and the token on the source chain. Fails with
    /// [`BridgeError::Configuration`] before anything touches the network.
    pub fn resolve(
        registry: &Registry,
        source: &str,
        destination: &str,
        token_kind: TokenKind,
        amount: U256,
        sender: Address,
    ) -> Result<Self, BridgeError> {
        let (source, destination) = registry.route(source, destination, token_kind)?;

        Ok(Self {
            token_address: source.token(token_kind)?,
            source: source.clone(),
            destination: destination.clone(),
            token_kind,
            amount,
            sender,
            recipient: sender,
        })
    }

    /// Delivers to `recipient` on the destination chain instead of the sender.
    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = recipient;
        self
    }
}

/// Hash of a submitted bridge transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub transaction_hash: TxHash,
}

impl TransactionOutcome {
    pub fn explorer_link(&self, chain: &ChainDescriptor) -> Option<String> {
        chain.explorer_url().map(|base| {
            format!("{}/tx/{}", base.trim_end_matches('/'), self.transaction_hash)
        })
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.transaction_hash)
    }
}

/// Everything `send` would be called with, without sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub pool: Address,
    pub params: BridgeParameters,
    pub fee: FeeQuote,
    pub value: U256,
}

/// Drives bridge transfers out of one source chain.
pub struct Bridge<I> {
    invoker: I,
    source: ChainDescriptor,
    slippage: Slippage,
    recipient: Option<Address>,
    observer: Option<Dispatch>,
}

impl<I: ContractInvoker> Bridge<I> {
    pub fn new(source: ChainDescriptor, invoker: I) -> Self {
        Self {
            invoker,
            source,
            slippage: Slippage::DEFAULT,
            recipient: None,
            observer: None,
        }
    }

    pub fn with_slippage(mut self, slippage: Slippage) -> Self {
        self.slippage = slippage;
        self
    }

    /// Recipient used by [`Bridge::bridge`]. Defaults to the sender.
    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Routes this bridge's tracing events to `observer` instead of the
    /// process-wide subscriber.
    pub fn with_observer(mut self, observer: impl Into<Dispatch>) -> Self {
        self.observer = Some(observer.into());
        self
    }

    pub fn source(&self) -> &ChainDescriptor {
        &self.source
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Bridges `amount` of `token_address` to the chain with endpoint id
    /// `destination_eid`, delivering to the configured recipient.
    pub async fn bridge(
        &self,
        token_address: Address,
        amount: U256,
        destination_eid: u32,
        token_kind: TokenKind,
    ) -> Result<TransactionOutcome, BridgeError> {
        let recipient = self.recipient.unwrap_or_else(|| self.invoker.sender());
        self.observe(self.run(token_address, amount, destination_eid, token_kind, recipient))
            .await
    }

    /// Runs `request`, which must originate on this bridge's source chain and
    /// be signed by the invoker's account.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransactionOutcome, BridgeError> {
        self.check_request(request)?;
        self.observe(self.run(
            request.token_address,
            request.amount,
            request.destination.endpoint_id,
            request.token_kind,
            request.recipient,
        ))
        .await
    }

    /// Builds parameters and quotes the fee for `request` without submitting
    /// anything, approval included.
    pub async fn quote(&self, request: &TransferRequest) -> Result<Quote, BridgeError> {
        self.check_request(request)?;
        self.observe(async {
            let pool = request.token_kind.pool(&self.source)?;
            let params = BridgeParameters::new(
                request.destination.endpoint_id,
                request.recipient,
                request.amount,
                self.slippage,
            );
            let fee = self.quote_fee(pool, &params).await?;
            let value = self.value_for(request.token_kind, pool, &fee, request.amount)?;
            info!(%pool, native_fee = %fee.native_fee, %value, "quoted bridge transfer");
            Ok::<_, BridgeError>(Quote {
                pool,
                params,
                fee,
                value,
            })
        })
        .await
    }

    async fn run(
        &self,
        token_address: Address,
        amount: U256,
        destination_eid: u32,
        token_kind: TokenKind,
        recipient: Address,
    ) -> Result<TransactionOutcome, BridgeError> {
        let span = info_span!(
            "bridge",
            chain = %self.source.name,
            token = %token_kind,
            %amount,
            destination_eid
        );

        async move {
            let pool = token_kind.pool(&self.source)?;

            if token_kind.requires_approval() {
                approval::approve(&self.invoker, token_address, pool, amount)
                    .await
                    .map_err(|source| {
                        warn!(%source, "approval failed, not bridging");
                        BridgeError::Approval {
                            chain: self.source.name.clone(),
                            token: token_address,
                            spender: pool,
                            amount,
                            source,
                        }
                    })?;
            }

            let params = BridgeParameters::new(destination_eid, recipient, amount, self.slippage);
            let fee = self.quote_fee(pool, &params).await?;
            let value = self.value_for(token_kind, pool, &fee, amount)?;

            let calldata = IStargate::sendCall {
                sendParam: (&params).into(),
                fee: fee.into(),
                refundAddress: self.invoker.sender(),
            }
            .abi_encode();

            info!(
                %pool,
                native_fee = %fee.native_fee,
                %value,
                minimum_received = %params.minimum_received,
                "submitting bridge transaction"
            );
            let transaction_hash = self
                .invoker
                .submit(pool, calldata.into(), value)
                .await
                .map_err(|source| self.transaction_error(token_kind, pool, source))?;

            info!(%transaction_hash, "bridge transaction submitted");
            Ok(TransactionOutcome { transaction_hash })
        }
        .instrument(span)
        .await
    }

    async fn quote_fee(
        &self,
        pool: Address,
        params: &BridgeParameters,
    ) -> Result<FeeQuote, BridgeError> {
        quote::quote_send(&self.invoker, pool, params)
            .await
            .map_err(|source| {
                warn!(%source, "fee quote failed");
                BridgeError::Quote {
                    chain: self.source.name.clone(),
                    pool,
                    source,
                }
            })
    }

    fn value_for(
        &self,
        token_kind: TokenKind,
        pool: Address,
        fee: &FeeQuote,
        amount: U256,
    ) -> Result<U256, BridgeError> {
        token_kind
            .transaction_value(fee.native_fee, amount)
            .ok_or_else(|| {
                self.transaction_error(
                    token_kind,
                    pool,
                    InvokerError::Build("transaction value overflows uint256".to_string()),
                )
            })
    }

    fn transaction_error(
        &self,
        token_kind: TokenKind,
        pool: Address,
        source: InvokerError,
    ) -> BridgeError {
        warn!(%source, "bridge transaction failed");
        BridgeError::Transaction {
            chain: self.source.name.clone(),
            pool,
            token_kind,
            source,
        }
    }

    fn check_request(&self, request: &TransferRequest) -> Result<(), BridgeError> {
        if request.source.chain_id != self.source.chain_id {
            return Err(BridgeError::configuration(format!(
                "transfer from {} handed to the {} bridge",
                request.source.name, self.source.name
            )));
        }
        if request.sender != self.invoker.sender() {
            return Err(BridgeError::configuration(format!(
                "transfer sender {} is not the signing account {}",
                request.sender,
                self.invoker.sender()
            )));
        }
        Ok(())
    }

    async fn observe<F, T>(&self, fut: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        match &self.observer {
            Some(dispatch) => fut.with_subscriber(dispatch.clone()).await,
            None => fut.await,
        }
    }
}
