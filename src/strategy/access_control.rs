//! Exploratory strategies that substitute the call's sender
//!
//! Permission-guarded functions revert for an arbitrary sender. These
//! strategies retry estimation from a sender likely to pass the guard. The
//! figures are marked exploratory because the real caller would revert.

use alloy::primitives::{address, Address, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use log::debug;

use super::ExecutionContext;
use crate::errors::StrategyError;
use crate::traits::{NetworkHandle, StrategyExecutor};
use crate::types::{CallRequest, MeasurementResult, Mode};

sol! {
    function owner() public view returns (address);
    function getRoleMember(bytes32 role, uint256 index) public view returns (address);
}

/// Well-known accounts of local development nodes (anvil, hardhat)
pub const DEV_ACCOUNTS: [Address; 5] = [
    address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
    address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
    address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
    address!("90F79bf6EB2c4f870365E785982E1f101E93b906"),
    address!("15d34AAf54267DB7D7c367839AAf71A00a2C6A65"),
];

/// Owner or default admin of `contract`, if it exposes either
pub async fn discover_owner(network: &dyn NetworkHandle, contract: Address) -> Option<Address> {
    let owner_call = CallRequest::new(contract, ownerCall {}.abi_encode().into());
    if let Ok(output) = network.simulate_read_only(&owner_call).await {
        if let Ok(owner) = ownerCall::abi_decode_returns(&output) {
            if !owner.is_zero() {
                return Some(owner);
            }
        }
    }

    let admin_call = CallRequest::new(
        contract,
        getRoleMemberCall {
            role: B256::ZERO,
            index: U256::ZERO,
        }
        .abi_encode()
        .into(),
    );
    let output = network.simulate_read_only(&admin_call).await.ok()?;
    getRoleMemberCall::abi_decode_returns(&output)
        .ok()
        .filter(|admin| !admin.is_zero())
}

/// Estimation from the discovered contract owner
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlBypassExecutor;

#[async_trait]
impl StrategyExecutor for AccessControlBypassExecutor {
    fn mode(&self) -> Mode {
        Mode::AccessControlBypass
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let owner = discover_owner(ctx.network, ctx.request.to)
            .await
            .ok_or_else(|| StrategyError::Execution("no owner or admin discoverable".into()))?;
        debug!("retrying {} as owner {}", ctx.function.name, owner);

        let gas = ctx.network.estimate_gas(&ctx.request.with_sender(owner)).await?;
        Ok(MeasurementResult::measured(Mode::AccessControlBypass, gas).with_sender(owner))
    }
}

/// Estimation from a list of alternate senders
///
/// The advised sender is tried first, then the configured candidates.
#[derive(Debug, Clone)]
pub struct MultiSenderExecutor {
    candidates: Vec<Address>,
}

impl MultiSenderExecutor {
    pub fn new(candidates: Vec<Address>) -> Self {
        Self { candidates }
    }
}

impl Default for MultiSenderExecutor {
    fn default() -> Self {
        Self::new(DEV_ACCOUNTS.to_vec())
    }
}

#[async_trait]
impl StrategyExecutor for MultiSenderExecutor {
    fn mode(&self) -> Mode {
        Mode::MultiSender
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let mut senders: Vec<Address> = ctx.advised_sender.into_iter().collect();
        for candidate in &self.candidates {
            if !senders.contains(candidate) && ctx.request.from != Some(*candidate) {
                senders.push(*candidate);
            }
        }

        let mut last_error = None;
        for sender in &senders {
            match ctx.network.estimate_gas(&ctx.request.with_sender(*sender)).await {
                Ok(gas) => {
                    debug!("{} estimated from sender {}", ctx.function.name, sender);
                    return Ok(MeasurementResult::measured(Mode::MultiSender, gas).with_sender(*sender));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(StrategyError::Execution(format!(
            "none of {} senders succeeded{}",
            senders.len(),
            last_error.map(|e| format!(" (last: {})", e)).unwrap_or_default()
        )))
    }
}
