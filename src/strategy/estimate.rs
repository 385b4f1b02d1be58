use async_trait::async_trait;
use log::debug;

use super::sponsored::SPONSOR_OVERHEAD;
use super::ExecutionContext;
use crate::errors::StrategyError;
use crate::traits::StrategyExecutor;
use crate::types::{MeasurementResult, Mode};

/// Confidence of an estimate that includes the nominal sponsor overhead
pub const SPONSORED_ESTIMATE_CONFIDENCE: u8 = 85;

/// Node-side `eth_estimateGas`
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateExecutor;

#[async_trait]
impl StrategyExecutor for EstimateExecutor {
    fn mode(&self) -> Mode {
        Mode::Estimate
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let gas = ctx.network.estimate_gas(ctx.request).await?;
        debug!("{} estimated at {} gas", ctx.function.name, gas);

        let result = MeasurementResult::measured(Mode::Estimate, gas);
        Ok(match ctx.sponsor {
            // The node cannot see paymaster validation, so add the nominal figure
            Some(_) => result
                .with_sponsor_overhead(SPONSOR_OVERHEAD)
                .with_confidence(SPONSORED_ESTIMATE_CONFIDENCE),
            None => result,
        })
    }
}
