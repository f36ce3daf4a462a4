use alloy::{
    primitives::{Address, U256},
    transports::TransportError,
};
use thiserror::Error;

use crate::token::TokenKind;

/// Failure reported by a [`ContractInvoker`](crate::invoker::ContractInvoker).
#[derive(Debug, Error)]
pub enum InvokerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed contract response: {0}")]
    Decode(#[from] alloy::sol_types::Error),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("cannot build transaction: {0}")]
    Build(String),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A chain, token or pool is missing from the registry, or the registry
    /// itself is unreadable. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The private key does not derive an account.
    #[error("invalid private key: {0}")]
    Credential(String),

    #[error("fee quote from pool {pool} on {chain} failed: {source}")]
    Quote {
        chain: String,
        pool: Address,
        #[source]
        source: InvokerError,
    },

    #[error("approval of {amount} of token {token} for {spender} on {chain} failed: {source}")]
    Approval {
        chain: String,
        token: Address,
        spender: Address,
        amount: U256,
        #[source]
        source: InvokerError,
    },

    #[error("{token_kind} bridge transaction to pool {pool} on {chain} failed: {source}")]
    Transaction {
        chain: String,
        pool: Address,
        token_kind: TokenKind,
        #[source]
        source: InvokerError,
    },

    #[error("balance lookup of {token_kind} on {chain} failed: {source}")]
    Balance {
        chain: String,
        token_kind: TokenKind,
        #[source]
        source: InvokerError,
    },

    #[error("insufficient {symbol} balance: requested {requested}, available {available}")]
    InsufficientBalance {
        symbol: String,
        requested: String,
        available: String,
    },

    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: &'static str },
}

impl BridgeError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
