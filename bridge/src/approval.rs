use alloy::{
    primitives::{Address, TxHash, U256},
    sol_types::SolCall,
};
use tracing::info;

use crate::{bindings::IERC20, error::InvokerError, invoker::ContractInvoker};

/// Submits `approve(spender, amount)` on `token` from the invoker's account and
/// waits for it to be mined.
///
/// The current allowance is not consulted: every call costs one transaction.
pub async fn approve<I>(
    invoker: &I,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<TxHash, InvokerError>
where
    I: ContractInvoker + ?Sized,
{
    let calldata = IERC20::approveCall { spender, amount }.abi_encode();

    info!(%token, %spender, %amount, "submitting approval");
    let tx_hash = invoker.submit(token, calldata.into(), U256::ZERO).await?;
    invoker.confirm(tx_hash).await?;
    info!(%tx_hash, "approval confirmed");

    Ok(tx_hash)
}
