//! Fee sponsor (paymaster) validation and sponsored estimation
//!
//! A sponsor is usable when it has code, exposes the paymaster validation
//! entry point and holds a positive deposit. Validation and post-op gas are
//! charged on top of the node's estimate because the node never executes
//! them for a plain call.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use log::{debug, warn};

use super::bytecode::push4_selectors;
use super::ExecutionContext;
use crate::errors::{NetworkError, StrategyError};
use crate::traits::{NetworkHandle, SponsorStatus, SponsorValidator, StrategyExecutor};
use crate::types::{CallRequest, MeasurementResult, Mode};

/// Gas charged by the sponsor's validation step
pub const SPONSOR_VALIDATION_GAS: u64 = 40_000;

/// Gas charged by the sponsor's post-operation hook
pub const SPONSOR_POST_OP_GAS: u64 = 10_000;

/// Total nominal overhead of a sponsored call
pub const SPONSOR_OVERHEAD: u64 = SPONSOR_VALIDATION_GAS + SPONSOR_POST_OP_GAS;

// Paymaster interface (ERC-4337 v0.7)
sol! {
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        bytes32 accountGasLimits;
        uint256 preVerificationGas;
        bytes32 gasFees;
        bytes paymasterAndData;
        bytes signature;
    }

    function validatePaymasterUserOp(PackedUserOperation userOp, bytes32 userOpHash, uint256 maxCost) external returns (bytes context, uint256 validationData);
    function postOp(uint8 mode, bytes context, uint256 actualGasCost, uint256 actualUserOpFeePerGas) external;
    function getDeposit() public view returns (uint256);
}

/// Checks a sponsor contract through a network handle
///
/// # Returns
/// * `Ok(SponsorStatus)` - `valid` is set when the validation entry point is
///   present and the deposit is positive
/// * `Err(_)` - The sponsor's code could not be fetched
pub async fn validate_on_chain(
    network: &dyn NetworkHandle,
    sponsor: Address,
) -> Result<SponsorStatus, NetworkError> {
    let code = network.get_deployed_code(sponsor).await?;
    if code.is_empty() {
        return Ok(SponsorStatus {
            valid: false,
            balance: U256::ZERO,
            supported_features: Vec::new(),
        });
    }

    let selectors = push4_selectors(&code);
    let mut supported_features = Vec::new();
    if selectors.contains(&validatePaymasterUserOpCall::SELECTOR) {
        supported_features.push("validatePaymasterUserOp".to_string());
    }
    if selectors.contains(&postOpCall::SELECTOR) {
        supported_features.push("postOp".to_string());
    }

    let deposit_call = CallRequest::new(sponsor, getDepositCall {}.abi_encode().into());
    let balance = match network.simulate_read_only(&deposit_call).await {
        Ok(output) => getDepositCall::abi_decode_returns(&output).unwrap_or_default(),
        Err(e) => {
            debug!("getDeposit on {} failed: {}", sponsor, e);
            U256::ZERO
        }
    };

    let valid = supported_features.iter().any(|f| f == "validatePaymasterUserOp") && !balance.is_zero();
    Ok(SponsorStatus {
        valid,
        balance,
        supported_features,
    })
}

/// [`SponsorValidator`] backed by on-chain reads
#[derive(Clone)]
pub struct OnChainSponsorValidator {
    network: Arc<dyn NetworkHandle>,
}

impl OnChainSponsorValidator {
    pub fn new(network: Arc<dyn NetworkHandle>) -> Self {
        Self { network }
    }
}

#[async_trait]
impl SponsorValidator for OnChainSponsorValidator {
    async fn validate(&self, sponsor: Address) -> Result<SponsorStatus, NetworkError> {
        validate_on_chain(self.network.as_ref(), sponsor).await
    }
}

/// Estimation with a validated fee sponsor
#[derive(Debug, Clone, Copy, Default)]
pub struct SponsoredExecutor;

#[async_trait]
impl StrategyExecutor for SponsoredExecutor {
    fn mode(&self) -> Mode {
        Mode::Sponsored
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let Some(sponsor) = ctx.sponsor else {
            return Err(StrategyError::UnsupportedMode {
                mode: Mode::Sponsored,
                reason: "no sponsor configured".into(),
            });
        };

        let status = match ctx.sponsor_validator {
            Some(validator) => validator.validate(sponsor).await,
            None => validate_on_chain(ctx.network, sponsor).await,
        }
        .map_err(|e| StrategyError::SponsorValidation {
            sponsor,
            reason: e.to_string(),
        })?;

        if !status.valid {
            let reason = if status.supported_features.is_empty() {
                "no paymaster entry points".to_string()
            } else if status.balance.is_zero() {
                "deposit is empty".to_string()
            } else {
                format!("incomplete interface ({})", status.supported_features.join(", "))
            };
            warn!("sponsor {} rejected: {}", sponsor, reason);
            return Err(StrategyError::SponsorValidation { sponsor, reason });
        }

        let gas = ctx.network.estimate_gas(ctx.request).await?;
        Ok(MeasurementResult::measured(Mode::Sponsored, gas).with_sponsor_overhead(SPONSOR_OVERHEAD))
    }
}
