//! Profiling sessions
//!
//! A [`Profiler`] runs every requested function `runs` times, one run after
//! the other with a fixed pause in between, and folds the runs into a
//! [`ProfilingSession`]. In fee-paying sessions any failure aborts the whole
//! session; gasless sessions always produce a figure for every run.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::json_abi::Function;
use alloy::primitives::{Address, U256};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::aggregator::RunAggregator;
use crate::cache::{CacheStats, ResultCache};
use crate::config::ProfilerConfig;
use crate::cost::{compute_cost, fetch_unit_price, format_native};
use crate::errors::ProfileError;
use crate::orchestrator::{MeasureRequest, Orchestrator};
use crate::strategy::ModeRegistry;
use crate::traits::{ArgumentAdvisor, NetworkHandle, SponsorValidator};
use crate::types::{get_default_native_token, AggregatedStats, RunRecord, TokenConfig};
use crate::utils::abi_utils::parse_function;
use crate::utils::unix_millis;

/// A function to profile
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub function: Function,
    /// `None` lets the argument advisor choose
    pub args: Option<Vec<Value>>,
    pub value: U256,
}

impl FunctionCall {
    pub fn new(function: Function) -> Self {
        Self {
            function,
            args: None,
            value: U256::ZERO,
        }
    }

    /// From a human-readable signature
    pub fn parse(signature: &str) -> Result<Self, ProfileError> {
        parse_function(signature).map(Self::new)
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Runs and statistics of one function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionProfile {
    pub signature: String,
    pub stats: AggregatedStats,
    pub runs: Vec<RunRecord>,
}

/// Result of profiling one contract
#[derive(Debug, Clone, Serialize)]
pub struct ProfilingSession {
    pub contract: Address,
    pub chain_id: Option<u64>,
    pub native_token: TokenConfig,
    pub gasless: bool,
    pub price_precision: u32,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    /// Keyed by canonical signature
    pub functions: BTreeMap<String, FunctionProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

impl ProfilingSession {
    pub fn function(&self, signature: &str) -> Option<&FunctionProfile> {
        self.functions.get(signature)
    }

    /// Cost in native-token units with the session's precision and symbol
    pub fn display_cost(&self, wei: U256) -> String {
        format!("{} {}", format_native(wei, self.price_precision), self.native_token.symbol)
    }

    pub fn to_json_pretty(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Drives profiling sessions against one network
pub struct Profiler {
    orchestrator: Orchestrator,
    config: ProfilerConfig,
}

impl Profiler {
    /// Validates `config` and builds a profiler with the standard strategies
    ///
    /// Gasless configurations with `use_cache` get a fresh cache sized from
    /// the configuration.
    pub fn new(network: Arc<dyn NetworkHandle>, config: ProfilerConfig) -> Result<Self, ProfileError> {
        config.validate()?;
        let mut orchestrator = Orchestrator::new(network).with_config(&config);
        if config.gasless && config.use_cache {
            orchestrator = orchestrator.with_cache(Arc::new(ResultCache::new(config.cache_ttl, config.cache_capacity)));
        }
        Ok(Self { orchestrator, config })
    }

    /// Shares `cache` with other profilers
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.orchestrator = self.orchestrator.with_cache(cache);
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn ArgumentAdvisor>) -> Self {
        self.orchestrator = self.orchestrator.with_advisor(advisor);
        self
    }

    pub fn with_sponsor_validator(mut self, validator: Arc<dyn SponsorValidator>) -> Self {
        self.orchestrator = self.orchestrator.with_sponsor_validator(validator);
        self
    }

    pub fn with_registry(mut self, registry: ModeRegistry) -> Self {
        self.orchestrator = self.orchestrator.with_registry(registry);
        self
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Profiles every call in `calls` against `contract`
    ///
    /// # Errors
    /// The first measurement error aborts the session; no partial session is
    /// returned.
    pub async fn profile(&self, contract: Address, calls: &[FunctionCall]) -> Result<ProfilingSession, ProfileError> {
        let network = self.orchestrator.network().clone();
        let started_at_ms = unix_millis();
        let gasless = self.config.gasless;

        let chain_id = network.chain_id().await.ok();
        let native_token = get_default_native_token(chain_id.unwrap_or(1));
        // One price per session; real runs use the receipt's price instead
        let session_price = if gasless {
            fetch_unit_price(network.as_ref()).await
        } else {
            None
        };

        info!(
            "profiling {} functions of {} ({} runs each, {})",
            calls.len(),
            contract,
            self.config.runs,
            if gasless { "gasless" } else { "fee-paying" }
        );

        let mut aggregator = RunAggregator::new();
        for call in calls {
            let signature = call.function.signature();
            let request = MeasureRequest {
                function: call.function.clone(),
                contract,
                args: call.args.clone(),
                sender: self.config.sender,
                value: call.value,
                sponsor: self.config.sponsor,
                mode: self.config.mode,
                fee_paying: !gasless,
            };

            for run_index in 0..self.config.runs {
                if run_index > 0 && !self.config.inter_run_delay.is_zero() {
                    sleep(self.config.inter_run_delay).await;
                }

                let run_started_at_ms = unix_millis();
                let clock = Instant::now();
                let measurement = self.orchestrator.measure(&request).await?;
                let duration_ms = clock.elapsed().as_millis() as u64;

                if let Some(tx) = &measurement.transaction {
                    if !tx.success {
                        return Err(ProfileError::TransactionFailed {
                            function: signature,
                            reason: format!("transaction {} reverted using {} gas", tx.tx_hash, tx.gas_used),
                        });
                    }
                }
                if !measurement.success {
                    warn!("{} run {} has no measured figure", signature, run_index);
                }

                let unit_price = match &measurement.transaction {
                    Some(tx) => Some(tx.effective_gas_price),
                    None => session_price,
                };
                let record = RunRecord {
                    run_index,
                    cost: compute_cost(measurement.gas_used, unit_price),
                    tx_hash: measurement.transaction.as_ref().map(|tx| tx.tx_hash),
                    block_number: measurement.transaction.as_ref().and_then(|tx| tx.block_number),
                    unit_price,
                    started_at_ms: run_started_at_ms,
                    duration_ms,
                    measurement,
                };
                aggregator.record(&signature, record);
            }
        }

        let functions = aggregator
            .signatures()
            .filter_map(|signature| {
                let stats = aggregator.snapshot(signature)?;
                Some((
                    signature.to_string(),
                    FunctionProfile {
                        signature: signature.to_string(),
                        stats,
                        runs: aggregator.runs(signature).to_vec(),
                    },
                ))
            })
            .collect::<BTreeMap<_, _>>();

        for profile in functions.values() {
            info!(
                "{}: avg {} gas over {} runs ({})",
                profile.signature, profile.stats.avg, profile.stats.call_count, profile.stats.efficiency
            );
        }

        Ok(ProfilingSession {
            contract,
            chain_id,
            native_token,
            gasless,
            price_precision: self.config.price_precision,
            started_at_ms,
            finished_at_ms: unix_millis(),
            functions,
            cache: self.orchestrator.cache().map(|cache| cache.stats()),
        })
    }
}
