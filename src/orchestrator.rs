//! Fallback orchestration
//!
//! [`Orchestrator::measure`] turns one call into one [`MeasurementResult`]:
//!
//! 1. Pick the primary mode and serve a cached result if one is fresh
//! 2. Resolve arguments and sender (caller-supplied, else the argument advisor)
//! 3. Run the primary, then the fallback chain
//!    `estimate -> static-call -> trace -> bytecode-heuristic`, each attempt
//!    under its own deadline
//! 4. Finalise the first success, or synthesise a low-confidence figure when
//!    every strategy failed
//!
//! Strategy errors never leave this module. Fee-paying calls only use the
//! direct mode and report exhaustion as [`ProfileError::AllStrategiesExhausted`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use alloy::json_abi::Function;
use alloy::primitives::{Address, U256};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::time::timeout;

use crate::advisor::{DefaultArgumentAdvisor, DEFAULT_SENDER};
use crate::cache::{CallFingerprint, ResultCache};
use crate::config::{ProfilerConfig, DEFAULT_ATTEMPT_TIMEOUT};
use crate::errors::{NetworkError, ProfileError, StrategyError};
use crate::strategy::{name_table, select_mode, ExecutionContext, ModeRegistry};
use crate::traits::{ArgumentAdvisor, NetworkHandle, SponsorValidator};
use crate::types::{Attempt, CallRequest, MeasurementResult, Mode};
use crate::utils::abi_utils::{default_args, encode_call};

/// Fallback order after the primary mode
pub const FALLBACK_CHAIN: [Mode; 4] = [Mode::Estimate, Mode::StaticCall, Mode::Trace, Mode::BytecodeHeuristic];

/// Modes inserted before the bytecode heuristic once a permission failure is seen
pub const PERMISSION_CHAIN: [Mode; 2] = [Mode::AccessControlBypass, Mode::MultiSender];

/// One call to measure
#[derive(Debug, Clone)]
pub struct MeasureRequest {
    pub function: Function,
    pub contract: Address,
    /// Arguments as JSON values; `None` asks the argument advisor
    pub args: Option<Vec<Value>>,
    pub sender: Option<Address>,
    pub value: U256,
    pub sponsor: Option<Address>,
    /// Forced primary mode
    pub mode: Option<Mode>,
    /// Send a real transaction instead of simulating
    pub fee_paying: bool,
}

impl MeasureRequest {
    pub fn new(contract: Address, function: Function) -> Self {
        Self {
            function,
            contract,
            args: None,
            sender: None,
            value: U256::ZERO,
            sponsor: None,
            mode: None,
            fee_paying: false,
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_sponsor(mut self, sponsor: Address) -> Self {
        self.sponsor = Some(sponsor);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn fee_paying(mut self, fee_paying: bool) -> Self {
        self.fee_paying = fee_paying;
        self
    }

    /// Mode tried first
    ///
    /// Fee-paying calls always start (and end) at `direct`. Otherwise a
    /// forced mode wins, then a sponsor, then the offline selector.
    pub fn primary_mode(&self) -> Mode {
        if self.fee_paying {
            Mode::Direct
        } else if let Some(mode) = self.mode {
            mode
        } else if self.sponsor.is_some() {
            Mode::Sponsored
        } else {
            select_mode(&self.function)
        }
    }
}

/// Attempt order for `primary`
pub fn fallback_chain(primary: Mode, fee_paying: bool) -> VecDeque<Mode> {
    let mut chain = VecDeque::from([primary]);
    if fee_paying {
        return chain;
    }
    let covered = |mode: Mode| {
        mode == primary
            || (primary == Mode::DebugMulti && matches!(mode, Mode::Estimate | Mode::StaticCall | Mode::Trace))
    };
    chain.extend(FALLBACK_CHAIN.into_iter().filter(|mode| !covered(*mode)));
    chain
}

/// Inserts the permission modes before the bytecode heuristic (or at the end)
fn insert_permission_modes(pending: &mut VecDeque<Mode>, tried: &[Attempt]) {
    let position = pending
        .iter()
        .position(|mode| *mode == Mode::BytecodeHeuristic)
        .unwrap_or(pending.len());
    let missing: Vec<Mode> = PERMISSION_CHAIN
        .into_iter()
        .filter(|mode| !pending.contains(mode) && !tried.iter().any(|a| a.mode == *mode))
        .collect();
    for (offset, mode) in missing.into_iter().enumerate() {
        pending.insert(position + offset, mode);
    }
}

/// Runs strategies until one measures the call
pub struct Orchestrator {
    network: Arc<dyn NetworkHandle>,
    registry: ModeRegistry,
    advisor: Arc<dyn ArgumentAdvisor>,
    sponsor_validator: Option<Arc<dyn SponsorValidator>>,
    cache: Option<Arc<ResultCache>>,
    attempt_timeout: Duration,
    gas_limit_buffer_percent: u64,
}

impl Orchestrator {
    /// Orchestrator with the standard registry, default advisor and no cache
    pub fn new(network: Arc<dyn NetworkHandle>) -> Self {
        Self {
            network,
            registry: ModeRegistry::standard(),
            advisor: Arc::new(DefaultArgumentAdvisor::default()),
            sponsor_validator: None,
            cache: None,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            gas_limit_buffer_percent: ProfilerConfig::default().gas_limit_buffer_percent,
        }
    }

    /// Applies the deadline and gas buffer of `config`
    pub fn with_config(mut self, config: &ProfilerConfig) -> Self {
        self.attempt_timeout = config.attempt_timeout;
        self.gas_limit_buffer_percent = config.gas_limit_buffer_percent;
        self
    }

    pub fn with_registry(mut self, registry: ModeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn ArgumentAdvisor>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn with_sponsor_validator(mut self, validator: Arc<dyn SponsorValidator>) -> Self {
        self.sponsor_validator = Some(validator);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    pub fn network(&self) -> &Arc<dyn NetworkHandle> {
        &self.network
    }

    /// Measures one call
    ///
    /// # Errors
    /// * [`ProfileError::Abi`] - the arguments do not encode
    /// * [`ProfileError::AllStrategiesExhausted`] - fee-paying call that could not be sent
    pub async fn measure(&self, req: &MeasureRequest) -> Result<MeasurementResult, ProfileError> {
        let function = &req.function;
        let signature = function.signature();

        let primary = req.primary_mode();
        let fingerprint = match (req.fee_paying, &req.args) {
            (true, _) => None,
            (false, Some(args)) => Some(CallFingerprint::new(
                req.contract,
                &encode_call(function, args)?,
                primary,
                req.sponsor,
                req.sender,
            )),
            (false, None) => Some(CallFingerprint::advised(
                req.contract,
                function.selector().as_slice(),
                primary,
                req.sponsor,
                req.sender,
            )),
        };

        if let (Some(cache), Some(fingerprint)) = (&self.cache, &fingerprint) {
            if let Some(hit) = cache.get(fingerprint) {
                debug!("{} served from cache ({} gas)", signature, hit.gas_used);
                return Ok(hit);
            }
        }

        let (args, advised_sender) = match &req.args {
            Some(args) => (args.clone(), None),
            None => match self.advisor.advise(function).await {
                Some(advice) => (advice.args, advice.sender),
                None => (default_args(function, DEFAULT_SENDER), None),
            },
        };

        let request = CallRequest {
            from: req.sender.or(advised_sender),
            to: req.contract,
            data: encode_call(function, &args)?,
            value: req.value,
            gas: None,
        };

        let mut pending = fallback_chain(primary, req.fee_paying);
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut sponsor = req.sponsor;
        let mut reverting = false;
        let mut revert_reason: Option<String> = None;
        let mut permission_expanded = false;

        while let Some(mode) = pending.pop_front() {
            if reverting && mode.repeats_estimation() {
                debug!("skipping {} for {}: arguments revert", mode, signature);
                continue;
            }

            let executor = match self.registry.get(mode) {
                Ok(executor) => executor,
                Err(e) => {
                    attempts.push(Attempt::failed(mode, &e));
                    continue;
                }
            };

            let ctx = ExecutionContext {
                network: self.network.as_ref(),
                function,
                request: &request,
                sponsor,
                sponsor_validator: self.sponsor_validator.as_deref(),
                advised_sender,
                attempt_timeout: self.attempt_timeout,
                gas_limit_buffer_percent: self.gas_limit_buffer_percent,
            };

            debug!("{}: attempting {}", signature, mode);
            let outcome = timeout(self.attempt_timeout, executor.execute(&ctx))
                .await
                .unwrap_or(Err(StrategyError::Timeout {
                    mode,
                    seconds: self.attempt_timeout.as_secs(),
                }));

            let err = match outcome {
                Ok(result) => {
                    attempts.push(Attempt::succeeded(mode));
                    let result = finalize(result, primary, attempts, revert_reason, request.from);
                    if result.used_fallback {
                        warn!("{} measured by fallback {} ({} gas)", signature, result.mode, result.gas_used);
                    } else {
                        info!("{} measured by {} ({} gas)", signature, result.mode, result.gas_used);
                    }
                    if let (Some(cache), Some(fingerprint)) = (&self.cache, fingerprint) {
                        cache.put(fingerprint, result.clone());
                    }
                    return Ok(result);
                }
                Err(err) => err,
            };

            debug!("{}: {} failed: {}", signature, mode, err);
            attempts.push(Attempt::failed(mode, &err));

            if !req.fee_paying && !permission_expanded && err.is_permission_error() {
                insert_permission_modes(&mut pending, &attempts);
                permission_expanded = true;
            }

            match err {
                StrategyError::SponsorValidation { sponsor: rejected, .. } => {
                    warn!("dropping sponsor {} for remaining attempts", rejected);
                    sponsor = None;
                }
                StrategyError::WouldRevert { reason } => {
                    revert_reason.get_or_insert(reason);
                    reverting = true;
                }
                StrategyError::Network(NetworkError::Reverted { reason: Some(reason), .. }) => {
                    revert_reason.get_or_insert(reason);
                }
                _ => {}
            }
        }

        if req.fee_paying {
            warn!("{}: every strategy failed, aborting", signature);
            return Err(ProfileError::AllStrategiesExhausted {
                function: signature,
                attempts,
            });
        }

        warn!("{}: every strategy failed, falling back to the name table", signature);
        attempts.push(Attempt::succeeded(Mode::NameHeuristic));
        Ok(finalize(
            name_table::guess(function),
            primary,
            attempts,
            revert_reason,
            request.from,
        ))
    }
}

/// Stamps orchestration metadata onto an executor's result
fn finalize(
    mut result: MeasurementResult,
    primary: Mode,
    attempts: Vec<Attempt>,
    revert_reason: Option<String>,
    sender: Option<Address>,
) -> MeasurementResult {
    result.used_fallback = result.mode != primary;
    result.confidence = result.confidence.min(primary.nominal_confidence());
    result.attempts = attempts;
    if result.revert_reason.is_none() {
        result.revert_reason = revert_reason;
    }
    if result.sender.is_none() {
        result.sender = sender;
    }
    result
}
