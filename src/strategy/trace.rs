use async_trait::async_trait;
use log::debug;

use super::ExecutionContext;
use crate::errors::{NetworkError, StrategyError};
use crate::traits::StrategyExecutor;
use crate::types::{MeasurementResult, Mode};

/// `debug_traceCall` execution trace
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceExecutor;

#[async_trait]
impl StrategyExecutor for TraceExecutor {
    fn mode(&self) -> Mode {
        Mode::Trace
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let trace = ctx.network.trace_call(ctx.request).await.map_err(|e| match e {
            NetworkError::Unsupported(reason) => StrategyError::UnsupportedMode {
                mode: Mode::Trace,
                reason,
            },
            other => other.into(),
        })?;

        if trace.failed {
            return Err(StrategyError::Execution(format!(
                "traced execution failed after {} gas",
                trace.gas_used
            )));
        }

        if let Some(steps) = trace.steps {
            debug!("{} traced: {} gas over {} steps", ctx.function.name, trace.gas_used, steps);
        }
        Ok(MeasurementResult::measured(Mode::Trace, trace.gas_used))
    }
}
