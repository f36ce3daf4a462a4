use alloy::{primitives::Address, sol_types::SolCall};
use tracing::debug;

use crate::{
    bindings::IStargate,
    error::InvokerError,
    invoker::ContractInvoker,
    params::{BridgeParameters, FeeQuote},
};

/// Asks `pool` what `send` with `params` costs, paid in native currency.
///
/// The same `params` must be submitted afterwards; a quote for anything else
/// is meaningless.
pub async fn quote_send<I>(
    invoker: &I,
    pool: Address,
    params: &BridgeParameters,
) -> Result<FeeQuote, InvokerError>
where
    I: ContractInvoker + ?Sized,
{
    let calldata = IStargate::quoteSendCall {
        sendParam: params.into(),
        payInLzToken: false,
    }
    .abi_encode();

    let raw = invoker.call(pool, calldata.into()).await?;
    let fee: FeeQuote = IStargate::quoteSendCall::abi_decode_returns(&raw, true)?
        .fee
        .into();

    debug!(%pool, native_fee = %fee.native_fee, "fee quoted");
    Ok(fee)
}
