use std::fmt;

use alloy::primitives::{Address, Bytes, B256, U256};

use crate::{
    bindings::{MessagingFee, SendParam},
    error::BridgeError,
};

const BPS_DENOMINATOR: u64 = 10_000;

/// Largest acceptable shortfall between sent and received amount, in basis
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slippage {
    bps: u16,
}

impl Slippage {
    /// 0.5%.
    pub const DEFAULT: Slippage = Slippage { bps: 50 };

    pub fn from_bps(bps: u16) -> Result<Self, BridgeError> {
        if u64::from(bps) >= BPS_DENOMINATOR {
            return Err(BridgeError::configuration(format!(
                "slippage of {bps} bps leaves nothing to receive"
            )));
        }
        Ok(Self { bps })
    }

    pub fn bps(self) -> u16 {
        self.bps
    }

    /// `floor(amount * (1 - slippage))`, without intermediate overflow.
    pub fn minimum_received(self, amount: U256) -> U256 {
        let denominator = U256::from(BPS_DENOMINATOR);
        let keep = U256::from(BPS_DENOMINATOR - u64::from(self.bps));
        let (quotient, remainder) = amount.div_rem(denominator);
        quotient * keep + remainder * keep / denominator
    }
}

impl Default for Slippage {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.bps / 100, self.bps % 100)
    }
}

/// Arguments of a Stargate `send`, also used verbatim for `quoteSend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeParameters {
    pub destination_eid: u32,
    pub recipient: B256,
    pub amount_sent: U256,
    pub minimum_received: U256,
    pub extra_options: Bytes,
    pub compose_msg: Bytes,
    pub oft_cmd: Bytes,
}

impl BridgeParameters {
    pub fn new(destination_eid: u32, recipient: Address, amount: U256, slippage: Slippage) -> Self {
        Self {
            destination_eid,
            recipient: encode_recipient(recipient),
            amount_sent: amount,
            minimum_received: slippage.minimum_received(amount),
            extra_options: Bytes::new(),
            compose_msg: Bytes::new(),
            oft_cmd: Bytes::new(),
        }
    }
}

/// ABI encoding of an `address` as a single word, the form Stargate expects
/// in `SendParam.to`.
pub fn encode_recipient(recipient: Address) -> B256 {
    recipient.into_word()
}

impl From<&BridgeParameters> for SendParam {
    fn from(params: &BridgeParameters) -> Self {
        SendParam {
            dstEid: params.destination_eid,
            to: params.recipient,
            amountLD: params.amount_sent,
            minAmountLD: params.minimum_received,
            extraOptions: params.extra_options.clone(),
            composeMsg: params.compose_msg.clone(),
            oftCmd: params.oft_cmd.clone(),
        }
    }
}

/// Native fee quoted for one bridge attempt. Not reusable across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub native_fee: U256,
    pub lz_token_fee: U256,
}

impl From<MessagingFee> for FeeQuote {
    fn from(fee: MessagingFee) -> Self {
        Self {
            native_fee: fee.nativeFee,
            lz_token_fee: fee.lzTokenFee,
        }
    }
}

impl From<FeeQuote> for MessagingFee {
    fn from(quote: FeeQuote) -> Self {
        MessagingFee {
            nativeFee: quote.native_fee,
            lzTokenFee: quote.lz_token_fee,
        }
    }
}
