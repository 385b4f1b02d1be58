use async_trait::async_trait;
use log::{debug, info, warn};

use super::ExecutionContext;
use crate::errors::StrategyError;
use crate::traits::StrategyExecutor;
use crate::types::{MeasurementResult, Mode};

/// Real fee-paying transaction
///
/// The gas limit is the node's estimate plus a configurable buffer; the
/// measured figure comes from the receipt. A mined but reverted transaction
/// is returned with `success = false`, its gas was spent all the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExecutor;

/// `gas` increased by `percent`
pub fn buffered_gas_limit(gas: u64, percent: u64) -> u64 {
    gas.saturating_add(gas.saturating_mul(percent) / 100)
}

#[async_trait]
impl StrategyExecutor for DirectExecutor {
    fn mode(&self) -> Mode {
        Mode::Direct
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let estimate = ctx.network.estimate_gas(ctx.request).await?;
        let limit = buffered_gas_limit(estimate, ctx.gas_limit_buffer_percent);
        debug!("{} sending with gas limit {} (estimate {})", ctx.function.name, limit, estimate);

        let outcome = ctx.network.submit_transaction(&ctx.request.with_gas(limit)).await?;
        if !outcome.success {
            warn!("{} reverted on chain after {} gas", outcome.tx_hash, outcome.gas_used);
            let mut result = MeasurementResult::measured(Mode::Direct, outcome.gas_used).with_transaction(outcome);
            result.success = false;
            return Ok(result);
        }

        info!(
            "{} mined in block {:?} using {} gas",
            outcome.tx_hash, outcome.block_number, outcome.gas_used
        );
        let mut result = MeasurementResult::measured(Mode::Direct, outcome.gas_used);
        if let Some(sender) = ctx.request.from {
            result = result.with_sender(sender);
        }
        Ok(result.with_transaction(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_gas_limit() {
        assert_eq!(buffered_gas_limit(100_000, 20), 120_000);
        assert_eq!(buffered_gas_limit(21_000, 0), 21_000);
        assert_eq!(buffered_gas_limit(u64::MAX, 20), u64::MAX);
    }
}
