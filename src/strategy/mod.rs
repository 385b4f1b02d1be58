//! Measurement strategies and their registry
//!
//! Every [`Mode`] except the synthetic name table is implemented by one
//! [`StrategyExecutor`]. Executors are bound to modes through an explicit
//! [`ModeRegistry`]; looking up a mode nobody registered is an error, never a
//! silent default.
//!
//! | Mode | Executor | Confidence |
//! |---|---|---|
//! | `estimate` | [`EstimateExecutor`] | 95 (85 with sponsor overhead) |
//! | `static-call` | [`StaticCallExecutor`] | 92 |
//! | `trace` | [`TraceExecutor`] | 90 |
//! | `debug-multi` | [`DebugMultiExecutor`] | best constituent + 5 |
//! | `sponsored` | [`SponsoredExecutor`] | 88 |
//! | `bytecode-heuristic` | [`BytecodeHeuristicExecutor`] | at most 30 |
//! | `access-control-bypass` | [`AccessControlBypassExecutor`] | 70 |
//! | `multi-sender` | [`MultiSenderExecutor`] | 60 |
//! | `direct` | [`DirectExecutor`] | 100 |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::json_abi::Function;
use alloy::primitives::Address;

use crate::errors::StrategyError;
use crate::traits::{NetworkHandle, SponsorValidator, StrategyExecutor};
use crate::types::{CallRequest, Mode};
use crate::utils::abi_utils::is_read_only;

pub mod access_control;
pub mod bytecode;
pub mod debug_multi;
pub mod direct;
pub mod estimate;
pub mod name_table;
pub mod sponsored;
pub mod static_call;
pub mod trace;

pub use access_control::{AccessControlBypassExecutor, MultiSenderExecutor};
pub use bytecode::BytecodeHeuristicExecutor;
pub use debug_multi::DebugMultiExecutor;
pub use direct::DirectExecutor;
pub use estimate::EstimateExecutor;
pub use sponsored::{OnChainSponsorValidator, SponsoredExecutor, SPONSOR_OVERHEAD};
pub use static_call::StaticCallExecutor;
pub use trace::TraceExecutor;

/// Parameter count above which tracing is preferred for its diagnostics
pub const TRACE_PARAM_THRESHOLD: usize = 3;

/// Everything an executor needs to measure one call
pub struct ExecutionContext<'a> {
    pub network: &'a dyn NetworkHandle,
    pub function: &'a Function,
    /// Call as currently prepared (arguments and sender)
    pub request: &'a CallRequest,
    /// Fee sponsor still in effect for this attempt
    pub sponsor: Option<Address>,
    pub sponsor_validator: Option<&'a dyn SponsorValidator>,
    /// Sender suggested by the argument advisor
    pub advised_sender: Option<Address>,
    /// Deadline applied to constituent calls of composite strategies
    pub attempt_timeout: Duration,
    /// Extra gas limit for real transactions, in percent
    pub gas_limit_buffer_percent: u64,
}

/// Mode expected to succeed with the highest confidence, chosen offline
///
/// view/pure functions use a static call, functions with more than
/// [`TRACE_PARAM_THRESHOLD`] parameters are traced, everything else is estimated.
pub fn select_mode(function: &Function) -> Mode {
    select_mode_for(is_read_only(function), function.inputs.len())
}

/// [`select_mode`] over the raw inputs
pub fn select_mode_for(read_only: bool, param_count: usize) -> Mode {
    if read_only {
        Mode::StaticCall
    } else if param_count > TRACE_PARAM_THRESHOLD {
        Mode::Trace
    } else {
        Mode::Estimate
    }
}

/// Explicit binding of modes to executors
#[derive(Clone, Default)]
pub struct ModeRegistry {
    executors: HashMap<Mode, Arc<dyn StrategyExecutor>>,
}

impl ModeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in executor
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EstimateExecutor));
        registry.register(Arc::new(StaticCallExecutor));
        registry.register(Arc::new(TraceExecutor));
        registry.register(Arc::new(DebugMultiExecutor::default()));
        registry.register(Arc::new(SponsoredExecutor));
        registry.register(Arc::new(BytecodeHeuristicExecutor));
        registry.register(Arc::new(AccessControlBypassExecutor));
        registry.register(Arc::new(MultiSenderExecutor::default()));
        registry.register(Arc::new(DirectExecutor));
        registry
    }

    /// Binds `executor` to its mode, replacing any previous binding
    pub fn register(&mut self, executor: Arc<dyn StrategyExecutor>) -> &mut Self {
        self.executors.insert(executor.mode(), executor);
        self
    }

    pub fn get(&self, mode: Mode) -> Result<Arc<dyn StrategyExecutor>, StrategyError> {
        self.executors.get(&mode).cloned().ok_or_else(|| StrategyError::UnsupportedMode {
            mode,
            reason: "no executor registered".into(),
        })
    }

    pub fn contains(&self, mode: Mode) -> bool {
        self.executors.contains_key(&mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::abi_utils::parse_function;

    #[test]
    fn test_view_and_pure_select_static_call() {
        for signature in [
            "function get() view returns (uint256)",
            "function add(uint256 a, uint256 b, uint256 c, uint256 d, uint256 e) pure returns (uint256)",
        ] {
            assert_eq!(select_mode(&parse_function(signature).unwrap()), Mode::StaticCall);
        }
    }

    #[test]
    fn test_state_changing_selection() {
        for params in 0..=TRACE_PARAM_THRESHOLD {
            assert_eq!(select_mode_for(false, params), Mode::Estimate);
        }
        assert_eq!(select_mode_for(false, 4), Mode::Trace);
        assert_eq!(
            select_mode(&parse_function("function transfer(address to, uint256 amount)").unwrap()),
            Mode::Estimate
        );
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ModeRegistry::standard();
        for mode in Mode::ALL {
            assert_eq!(registry.contains(mode), mode != Mode::NameHeuristic);
        }
        assert!(matches!(
            ModeRegistry::new().get(Mode::Estimate),
            Err(StrategyError::UnsupportedMode { mode: Mode::Estimate, .. })
        ));
    }
}
