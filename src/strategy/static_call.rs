use async_trait::async_trait;
use log::debug;

use super::ExecutionContext;
use crate::errors::{NetworkError, StrategyError};
use crate::traits::StrategyExecutor;
use crate::types::{MeasurementResult, Mode};

/// `eth_call` trial followed by estimation
///
/// The trial turns a revert into [`StrategyError::WouldRevert`] before any
/// estimation is spent on arguments that cannot succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCallExecutor;

#[async_trait]
impl StrategyExecutor for StaticCallExecutor {
    fn mode(&self) -> Mode {
        Mode::StaticCall
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        match ctx.network.simulate_read_only(ctx.request).await {
            Ok(output) => debug!("{} static call returned {} bytes", ctx.function.name, output.len()),
            Err(NetworkError::Reverted { reason, .. }) => {
                return Err(StrategyError::WouldRevert {
                    reason: reason.unwrap_or_else(|| "reverted without reason".into()),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let gas = ctx.network.estimate_gas(ctx.request).await?;
        Ok(MeasurementResult::measured(Mode::StaticCall, gas))
    }
}
