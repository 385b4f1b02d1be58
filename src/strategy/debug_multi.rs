use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::timeout;

use super::{EstimateExecutor, ExecutionContext, StaticCallExecutor, TraceExecutor};
use crate::errors::StrategyError;
use crate::traits::StrategyExecutor;
use crate::types::{MeasurementResult, Mode};

/// Confidence added when one constituent succeeds
pub const CROSS_VALIDATION_BONUS: u8 = 5;

/// Estimate, static call and trace run concurrently
///
/// The highest-confidence success wins and is reported under
/// [`Mode::DebugMulti`] with a small bonus. Fails only when all three fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugMultiExecutor {
    estimate: EstimateExecutor,
    static_call: StaticCallExecutor,
    trace: TraceExecutor,
}

/// Deadline of each constituent, strictly inside the whole attempt's deadline
/// so a hung constituent never discards the others' results
pub fn constituent_timeout(attempt_timeout: Duration) -> Duration {
    attempt_timeout * 9 / 10
}

async fn bounded<F>(ctx: &ExecutionContext<'_>, mode: Mode, fut: F) -> Result<MeasurementResult, StrategyError>
where
    F: Future<Output = Result<MeasurementResult, StrategyError>>,
{
    let deadline = constituent_timeout(ctx.attempt_timeout);
    timeout(deadline, fut).await.unwrap_or(Err(StrategyError::Timeout {
        mode,
        seconds: deadline.as_secs(),
    }))
}

#[async_trait]
impl StrategyExecutor for DebugMultiExecutor {
    fn mode(&self) -> Mode {
        Mode::DebugMulti
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let (estimate, static_call, trace) = tokio::join!(
            bounded(ctx, Mode::Estimate, self.estimate.execute(ctx)),
            bounded(ctx, Mode::StaticCall, self.static_call.execute(ctx)),
            bounded(ctx, Mode::Trace, self.trace.execute(ctx)),
        );

        let mut best: Option<MeasurementResult> = None;
        let mut errors = Vec::new();
        let mut would_revert = None;
        for (mode, outcome) in [
            (Mode::Estimate, estimate),
            (Mode::StaticCall, static_call),
            (Mode::Trace, trace),
        ] {
            match outcome {
                Ok(result) => {
                    debug!("{} constituent {} measured {} gas", ctx.function.name, mode, result.gas_used);
                    if best.as_ref().map_or(true, |b| result.confidence > b.confidence) {
                        best = Some(result);
                    }
                }
                Err(e) => {
                    if let StrategyError::WouldRevert { reason } = &e {
                        would_revert.get_or_insert_with(|| reason.clone());
                    }
                    errors.push(format!("{}: {}", mode, e));
                }
            }
        }

        match best {
            Some(mut result) => {
                let confidence = result.confidence.saturating_add(CROSS_VALIDATION_BONUS);
                result.mode = Mode::DebugMulti;
                Ok(result.with_confidence(confidence))
            }
            None => match would_revert {
                Some(reason) => Err(StrategyError::WouldRevert { reason }),
                None => Err(StrategyError::Execution(format!(
                    "all constituents failed ({})",
                    errors.join("; ")
                ))),
            },
        }
    }
}
