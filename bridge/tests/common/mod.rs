//! In-memory chain used by the integration tests.
//!
//! Decodes every call with the crate's own bindings and records it, so tests
//! can assert on what would have reached the chain and in which order.

#![allow(dead_code)]

use std::sync::Mutex;

use alloy::{
    primitives::{address, Address, Bytes, TxHash, U256},
    sol_types::{SolCall, SolValue},
};
use async_trait::async_trait;
use stargate_bridge::{
    bindings::{IERC20, IStargate, MessagingFee, SendParam},
    ContractInvoker, InvokerError, Registry,
};

pub const SENDER: Address = address!("5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Confirm(TxHash),
    Quote {
        pool: Address,
        param: SendParam,
        pay_in_lz_token: bool,
    },
    Send {
        pool: Address,
        param: SendParam,
        fee: MessagingFee,
        refund: Address,
        value: U256,
    },
    Read {
        to: Address,
    },
    NativeBalance(Address),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub approval: bool,
    pub approval_reverts: bool,
    pub quote: bool,
    pub submit: bool,
}

pub struct MockInvoker {
    sender: Address,
    native_fee: U256,
    failures: Failures,
    native_balance: U256,
    token_balance: U256,
    token_decimals: u8,
    log: Mutex<Vec<Recorded>>,
    nonce: Mutex<u8>,
}

impl MockInvoker {
    pub fn new(native_fee: u128) -> Self {
        Self {
            sender: SENDER,
            native_fee: U256::from(native_fee),
            failures: Failures::default(),
            native_balance: U256::ZERO,
            token_balance: U256::ZERO,
            token_decimals: 6,
            log: Mutex::new(Vec::new()),
            nonce: Mutex::new(0),
        }
    }

    pub fn failing(mut self, failures: Failures) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_balances(mut self, native: u128, token: u128) -> Self {
        self.native_balance = U256::from(native);
        self.token_balance = U256::from(token);
        self
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn approvals(&self) -> Vec<Recorded> {
        self.matching(|c| matches!(c, Recorded::Approve { .. }))
    }

    pub fn quotes(&self) -> Vec<Recorded> {
        self.matching(|c| matches!(c, Recorded::Quote { .. }))
    }

    pub fn sends(&self) -> Vec<Recorded> {
        self.matching(|c| matches!(c, Recorded::Send { .. }))
    }

    fn matching(&self, f: impl Fn(&Recorded) -> bool) -> Vec<Recorded> {
        self.calls().into_iter().filter(|c| f(c)).collect()
    }

    fn record(&self, call: Recorded) {
        self.log.lock().unwrap().push(call);
    }

    fn next_hash(&self) -> TxHash {
        let mut nonce = self.nonce.lock().unwrap();
        *nonce += 1;
        TxHash::with_last_byte(*nonce)
    }
}

fn selector(data: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&data[..4]);
    out
}

#[async_trait]
impl ContractInvoker for MockInvoker {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, InvokerError> {
        let selector = selector(&calldata);
        if selector == IStargate::quoteSendCall::SELECTOR {
            let call = IStargate::quoteSendCall::abi_decode(&calldata, true)?;
            self.record(Recorded::Quote {
                pool: to,
                param: call.sendParam,
                pay_in_lz_token: call.payInLzToken,
            });
            if self.failures.quote {
                return Err(InvokerError::Rejected("execution reverted".to_string()));
            }
            let fee = MessagingFee {
                nativeFee: self.native_fee,
                lzTokenFee: U256::ZERO,
            };
            return Ok((fee,).abi_encode_params().into());
        }

        self.record(Recorded::Read { to });
        if selector == IERC20::balanceOfCall::SELECTOR {
            Ok((self.token_balance,).abi_encode_params().into())
        } else if selector == IERC20::decimalsCall::SELECTOR {
            Ok((U256::from(self.token_decimals),).abi_encode_params().into())
        } else if selector == IERC20::symbolCall::SELECTOR {
            Ok((String::from("USDC"),).abi_encode_params().into())
        } else {
            Err(InvokerError::Rejected(format!("unexpected call {selector:?}")))
        }
    }

    async fn submit(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> Result<TxHash, InvokerError> {
        let selector = selector(&calldata);
        if selector == IERC20::approveCall::SELECTOR {
            let call = IERC20::approveCall::abi_decode(&calldata, true)?;
            assert_eq!(value, U256::ZERO, "approval must not carry value");
            self.record(Recorded::Approve {
                token: to,
                spender: call.spender,
                amount: call.amount,
            });
            if self.failures.approval {
                return Err(InvokerError::Rejected("user rejected approval".to_string()));
            }
        } else if selector == IStargate::sendCall::SELECTOR {
            let call = IStargate::sendCall::abi_decode(&calldata, true)?;
            self.record(Recorded::Send {
                pool: to,
                param: call.sendParam,
                fee: call.fee,
                refund: call.refundAddress,
                value,
            });
            if self.failures.submit {
                return Err(InvokerError::Rejected("insufficient funds for gas".to_string()));
            }
        } else {
            return Err(InvokerError::Rejected(format!("unexpected submit {selector:?}")));
        }
        Ok(self.next_hash())
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<(), InvokerError> {
        self.record(Recorded::Confirm(tx_hash));
        if self.failures.approval_reverts {
            return Err(InvokerError::Rejected(format!("{tx_hash} reverted")));
        }
        Ok(())
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, InvokerError> {
        self.record(Recorded::NativeBalance(owner));
        Ok(self.native_balance)
    }
}

pub fn registry() -> Registry {
    Registry::builtin().expect("built-in registry parses")
}
