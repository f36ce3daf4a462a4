//! Stargate V2 bridge transfers between EVM chains.
//!
//! A transfer resolves its chains against the [`Registry`], optionally
//! approves the pool to pull an ERC-20, quotes the LayerZero fee with the exact
//! parameters it is about to send, and submits `send` with the right `value`.
//! Chain access goes through a [`ContractInvoker`], so the sequence can run
//! against a node ([`RpcInvoker`]) or a test double.

pub mod approval;
pub mod balance;
pub mod bindings;
pub mod config;
pub mod error;
pub mod invoker;
pub mod orchestrator;
pub mod params;
pub mod quote;
pub mod registry;
pub mod token;

pub use balance::{ensure_affordable, fetch_balance, parse_amount, Balance};
pub use config::PrivateKey;
pub use error::{BridgeError, InvokerError};
pub use invoker::{connect, ContractInvoker, RpcInvoker};
pub use orchestrator::{Bridge, Quote, TransactionOutcome, TransferRequest};
pub use params::{BridgeParameters, FeeQuote, Slippage};
pub use registry::{ChainDescriptor, Registry};
pub use token::TokenKind;
