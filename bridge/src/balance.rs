//! Account balances and human-readable amounts.

use std::fmt;

use alloy::{
    primitives::{utils::format_units, Address, U256},
    sol_types::SolCall,
};

use crate::{
    bindings::IERC20,
    error::{BridgeError, InvokerError},
    invoker::ContractInvoker,
    registry::ChainDescriptor,
    token::TokenKind,
};

const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub amount_raw: U256,
    pub decimals: u8,
    pub symbol: String,
}

impl Balance {
    pub fn human(&self) -> String {
        format_units(self.amount_raw, self.decimals).unwrap_or_else(|_| self.amount_raw.to_string())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.human(), self.symbol)
    }
}

/// Balance of `owner` in the `kind` asset on `chain`.
pub async fn fetch_balance<I>(
    invoker: &I,
    chain: &ChainDescriptor,
    kind: TokenKind,
    owner: Address,
) -> Result<Balance, BridgeError>
where
    I: ContractInvoker + ?Sized,
{
    let token = chain.token(kind)?;
    let wrap = |source: InvokerError| BridgeError::Balance {
        chain: chain.name.clone(),
        token_kind: kind,
        source,
    };

    match kind {
        TokenKind::Native => Ok(Balance {
            amount_raw: invoker.native_balance(owner).await.map_err(wrap)?,
            decimals: NATIVE_DECIMALS,
            symbol: chain.native_symbol.clone(),
        }),
        TokenKind::StandardAsset => erc20_balance(invoker, token, owner).await.map_err(wrap),
    }
}

async fn erc20_balance<I>(invoker: &I, token: Address, owner: Address) -> Result<Balance, InvokerError>
where
    I: ContractInvoker + ?Sized,
{
    let raw = invoker
        .call(token, IERC20::balanceOfCall { account: owner }.abi_encode().into())
        .await?;
    let amount_raw = IERC20::balanceOfCall::abi_decode_returns(&raw, true)?._0;

    let raw = invoker
        .call(token, IERC20::decimalsCall {}.abi_encode().into())
        .await?;
    let decimals = IERC20::decimalsCall::abi_decode_returns(&raw, true)?._0;

    let raw = invoker
        .call(token, IERC20::symbolCall {}.abi_encode().into())
        .await?;
    let symbol = IERC20::symbolCall::abi_decode_returns(&raw, true)?._0;

    Ok(Balance {
        amount_raw,
        decimals,
        symbol,
    })
}

/// Converts a decimal string such as `"1.25"` into base units.
///
/// Rejects zero, signs, exponents and more fractional digits than the token
/// has.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, BridgeError> {
    let invalid = |reason| BridgeError::InvalidAmount {
        input: input.to_string(),
        reason,
    };

    let text = input.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a plain decimal number"));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(invalid("more fractional digits than the token supports"));
    }

    let padded = format!("{whole}{fraction:0<width$}", width = usize::from(decimals));
    let digits = padded.trim_start_matches('0');
    let amount = if digits.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(digits, 10).map_err(|_| invalid("too large"))?
    };

    if amount.is_zero() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(amount)
}

/// Fails when `amount` exceeds what `balance` holds.
pub fn ensure_affordable(amount: U256, balance: &Balance) -> Result<(), BridgeError> {
    if balance.amount_raw.is_zero() || amount > balance.amount_raw {
        return Err(BridgeError::InsufficientBalance {
            symbol: balance.symbol.clone(),
            requested: format_units(amount, balance.decimals)
                .unwrap_or_else(|_| amount.to_string()),
            available: balance.human(),
        });
    }
    Ok(())
}
