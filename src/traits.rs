//! Collaborator contracts of the profiling core
//!
//! This module provides the traits at the seams of the engine:
//! - `NetworkHandle`: capability set of a blockchain RPC endpoint
//! - `StrategyExecutor`: one measurement technique
//! - `ArgumentAdvisor`: source of plausible arguments and senders
//! - `SponsorValidator`: fee sponsor (paymaster) interface checks
//!
//! Any implementation satisfying these contracts can be plugged into the
//! [`Orchestrator`](crate::orchestrator::Orchestrator).

use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use serde::Serialize;

use crate::errors::{NetworkError, StrategyError};
use crate::strategy::ExecutionContext;
use crate::types::{CallRequest, MeasurementResult, Mode, TraceSummary, TransactionOutcome};

/// Capability set of a network endpoint
///
/// `estimate_gas`, `simulate_read_only`, `trace_call`, `fetch_unit_price` and
/// `get_deployed_code` are required. Storage reads and transaction submission
/// are optional and report [`NetworkError::Unsupported`] by default.
#[async_trait]
pub trait NetworkHandle: Send + Sync {
    /// Node-side gas estimation of `call`
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, NetworkError>;

    /// Evaluates `call` without changing state and returns its output
    async fn simulate_read_only(&self, call: &CallRequest) -> Result<Bytes, NetworkError>;

    /// Detailed execution trace of `call`
    async fn trace_call(&self, call: &CallRequest) -> Result<TraceSummary, NetworkError>;

    /// Current price of one gas unit, in wei
    async fn fetch_unit_price(&self) -> Result<u128, NetworkError>;

    /// Runtime bytecode deployed at `address` (empty for accounts without code)
    async fn get_deployed_code(&self, address: Address) -> Result<Bytes, NetworkError>;

    /// Raw storage slot read
    async fn get_storage_at(&self, _address: Address, _slot: U256) -> Result<U256, NetworkError> {
        Err(NetworkError::Unsupported("eth_getStorageAt".into()))
    }

    /// Sends `call` as a real transaction and waits for its receipt
    async fn submit_transaction(&self, _call: &CallRequest) -> Result<TransactionOutcome, NetworkError> {
        Err(NetworkError::Unsupported("eth_sendTransaction".into()))
    }

    /// Chain identifier of the endpoint
    async fn chain_id(&self) -> Result<u64, NetworkError> {
        Err(NetworkError::Unsupported("eth_chainId".into()))
    }
}

/// A single measurement technique
#[async_trait]
pub trait StrategyExecutor: Send + Sync {
    /// Mode this executor implements
    fn mode(&self) -> Mode;

    /// Attempts to measure the call described by `ctx`
    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError>;
}

/// Arguments and sender suggested for a function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentAdvice {
    /// One JSON value per function input
    pub args: Vec<serde_json::Value>,
    /// Sender likely to pass the function's guards
    pub sender: Option<Address>,
    /// Advisor's own confidence in the suggestion, 0..=100
    pub confidence: u8,
}

/// Source of plausible call arguments and senders
///
/// Advice is a hint: callers tolerate `None` and fall back to caller-supplied
/// or default arguments.
#[async_trait]
pub trait ArgumentAdvisor: Send + Sync {
    async fn advise(&self, function: &Function) -> Option<ArgumentAdvice>;
}

/// Validation outcome for a fee sponsor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorStatus {
    pub valid: bool,
    /// Sponsor deposit or balance, in wei
    pub balance: U256,
    /// Entry points detected on the sponsor contract
    pub supported_features: Vec<String>,
}

/// Interface check for fee sponsor contracts
#[async_trait]
pub trait SponsorValidator: Send + Sync {
    async fn validate(&self, sponsor: Address) -> Result<SponsorStatus, NetworkError>;
}
