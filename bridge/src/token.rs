use std::{fmt, str::FromStr};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{error::BridgeError, registry::ChainDescriptor};

/// The kinds of asset a Stargate pool can move.
///
/// Each kind decides which pool on the source chain is called, whether an
/// ERC-20 approval must precede the bridge call, and what the transaction
/// `value` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// The chain's gas currency, sent to the native pool as `msg.value`.
    #[serde(rename = "ETH")]
    Native,
    /// An ERC-20 asset pulled by the pool through an allowance.
    #[serde(rename = "USDC")]
    StandardAsset,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::Native, TokenKind::StandardAsset];

    pub fn symbol(self) -> &'static str {
        match self {
            TokenKind::Native => "ETH",
            TokenKind::StandardAsset => "USDC",
        }
    }

    pub fn requires_approval(self) -> bool {
        matches!(self, TokenKind::StandardAsset)
    }

    /// Pool on `chain` that accepts this kind.
    pub fn pool(self, chain: &ChainDescriptor) -> Result<Address, BridgeError> {
        chain.pool(self)
    }

    /// `value` of the bridge transaction for a quoted native fee.
    ///
    /// Native transfers carry the principal alongside the fee; ERC-20 transfers
    /// pay only the fee since the pool pulls the tokens itself. `None` on
    /// overflow.
    pub fn transaction_value(self, native_fee: U256, amount: U256) -> Option<U256> {
        match self {
            TokenKind::Native => native_fee.checked_add(amount),
            TokenKind::StandardAsset => Some(native_fee),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TokenKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eth" | "native" => Ok(TokenKind::Native),
            "usdc" | "standard" => Ok(TokenKind::StandardAsset),
            other => Err(BridgeError::configuration(format!(
                "unsupported token {other:?}, expected one of ETH, USDC"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_value_adds_principal() {
        let fee = U256::from(200_000_000_000_000u64);
        let amount = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(
            TokenKind::Native.transaction_value(fee, amount),
            Some(U256::from(1_000_200_000_000_000_000u128))
        );
    }

    #[test]
    fn test_standard_value_is_fee_only() {
        for (fee, amount) in [(0u64, 0u64), (0, 500_000_000), (150_000_000_000_000, 500_000_000)] {
            assert_eq!(
                TokenKind::StandardAsset.transaction_value(U256::from(fee), U256::from(amount)),
                Some(U256::from(fee))
            );
        }
    }

    #[test]
    fn test_native_value_with_zero_fee_or_amount() {
        assert_eq!(
            TokenKind::Native.transaction_value(U256::ZERO, U256::from(7u64)),
            Some(U256::from(7u64))
        );
        assert_eq!(
            TokenKind::Native.transaction_value(U256::from(7u64), U256::ZERO),
            Some(U256::from(7u64))
        );
        assert_eq!(TokenKind::Native.transaction_value(U256::MAX, U256::from(1u64)), None);
    }

    #[test]
    fn test_approval_only_for_standard_asset() {
        assert!(!TokenKind::Native.requires_approval());
        assert!(TokenKind::StandardAsset.requires_approval());
    }

    #[test]
    fn test_parse() {
        assert_eq!("eth".parse::<TokenKind>().unwrap(), TokenKind::Native);
        assert_eq!("USDC".parse::<TokenKind>().unwrap(), TokenKind::StandardAsset);
        assert!(matches!(
            "DAI".parse::<TokenKind>(),
            Err(BridgeError::Configuration(_))
        ));
    }
}
