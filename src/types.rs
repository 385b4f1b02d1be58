//! Core types for gas measurement and profiling
//!
//! This module defines the data structures shared by every component:
//! - Measurement modes and their nominal confidence
//! - Call requests handed to the network handle
//! - Measurement results with their attempt history
//! - Run records and aggregated statistics
//! - Native token configuration for display

use std::fmt;

pub use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Measurement technique used to obtain a gas figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Node-side `eth_estimateGas`
    Estimate,
    /// `eth_call` trial followed by estimation
    StaticCall,
    /// `debug_traceCall` execution trace
    Trace,
    /// Estimate, static call and trace cross-validated
    DebugMulti,
    /// Estimation with a validated fee sponsor (paymaster)
    Sponsored,
    /// Static analysis of deployed bytecode
    BytecodeHeuristic,
    /// Estimation from the discovered contract owner
    AccessControlBypass,
    /// Estimation from a list of alternate senders
    MultiSender,
    /// Real fee-paying transaction
    Direct,
    /// Synthetic figure from the function-name table
    NameHeuristic,
}

impl Mode {
    /// Every mode, in declaration order
    pub const ALL: [Mode; 10] = [
        Mode::Estimate,
        Mode::StaticCall,
        Mode::Trace,
        Mode::DebugMulti,
        Mode::Sponsored,
        Mode::BytecodeHeuristic,
        Mode::AccessControlBypass,
        Mode::MultiSender,
        Mode::Direct,
        Mode::NameHeuristic,
    ];

    /// Short stable identifier, also used in fingerprints
    pub fn tag(&self) -> &'static str {
        match self {
            Mode::Estimate => "estimate",
            Mode::StaticCall => "static-call",
            Mode::Trace => "trace",
            Mode::DebugMulti => "debug-multi",
            Mode::Sponsored => "sponsored",
            Mode::BytecodeHeuristic => "bytecode-heuristic",
            Mode::AccessControlBypass => "access-control-bypass",
            Mode::MultiSender => "multi-sender",
            Mode::Direct => "direct",
            Mode::NameHeuristic => "name-heuristic",
        }
    }

    /// Confidence a successful measurement in this mode normally carries
    pub fn nominal_confidence(&self) -> u8 {
        match self {
            Mode::Direct => 100,
            Mode::DebugMulti => 100,
            Mode::Estimate => 95,
            Mode::StaticCall => 92,
            Mode::Trace => 90,
            Mode::Sponsored => 88,
            Mode::AccessControlBypass => 70,
            Mode::MultiSender => 60,
            Mode::BytecodeHeuristic => 30,
            Mode::NameHeuristic => 10,
        }
    }

    /// Whether the mode only re-runs node-side estimation of the same call
    ///
    /// Such modes are pointless once a static evaluation proved the
    /// arguments revert.
    pub fn repeats_estimation(&self) -> bool {
        matches!(
            self,
            Mode::Estimate | Mode::StaticCall | Mode::Sponsored | Mode::DebugMulti | Mode::Direct
        )
    }

    /// Whether results from this mode are exploratory (sender was substituted)
    pub fn is_exploratory(&self) -> bool {
        matches!(self, Mode::AccessControlBypass | Mode::MultiSender)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|mode| mode.tag() == s)
            .ok_or_else(|| format!("unknown mode `{s}`"))
    }
}

/// Parameters of a call evaluated by the network handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    /// Call sender; `None` lets the node pick its default
    pub from: Option<Address>,
    /// Target contract
    pub to: Address,
    /// ABI-encoded calldata (selector + arguments)
    pub data: Bytes,
    /// Native token value attached to the call
    pub value: U256,
    /// Explicit gas limit, if any
    pub gas: Option<u64>,
}

impl CallRequest {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            from: None,
            to,
            data,
            value: U256::ZERO,
            gas: None,
        }
    }

    /// Returns a copy of this request sent from `sender`
    pub fn with_sender(&self, sender: Address) -> Self {
        Self {
            from: Some(sender),
            ..self.clone()
        }
    }

    pub fn with_gas(&self, gas: u64) -> Self {
        Self {
            gas: Some(gas),
            ..self.clone()
        }
    }
}

/// Summary of an execution trace returned by the network handle
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    /// Gas consumed by the traced execution
    pub gas_used: u64,
    /// Whether the traced execution failed
    pub failed: bool,
    /// Number of executed opcodes, when the tracer reports them
    pub steps: Option<usize>,
}

/// Receipt data of a real transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionOutcome {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Price actually paid per gas unit, in wei
    pub effective_gas_price: u128,
    pub success: bool,
}

/// One step of the fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub mode: Mode,
    /// `None` for the attempt that produced the result
    pub error: Option<String>,
}

impl Attempt {
    pub fn failed(mode: Mode, error: impl ToString) -> Self {
        Self {
            mode,
            error: Some(error.to_string()),
        }
    }

    pub fn succeeded(mode: Mode) -> Self {
        Self { mode, error: None }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of measuring one call
///
/// Built by an executor, finalised once by the orchestrator and then only
/// cloned, cached or folded into a [`RunRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasurementResult {
    /// `false` for synthetic results produced after every strategy failed and
    /// for real transactions that reverted
    pub success: bool,
    /// Total gas figure, `base_gas + sponsor_overhead`
    pub gas_used: u64,
    /// Gas attributable to the call itself
    pub base_gas: u64,
    /// Additional gas charged by sponsor validation and post-op
    pub sponsor_overhead: u64,
    /// Confidence in the figure, 0..=100
    pub confidence: u8,
    /// Mode that produced the figure
    pub mode: Mode,
    /// Whether the producing mode was not the primary one
    pub used_fallback: bool,
    /// Every attempt in order, the producing one last
    pub attempts: Vec<Attempt>,
    /// Figure obtained with a substituted sender
    pub exploratory: bool,
    /// Sender used for the successful evaluation, if substituted or advised
    pub sender: Option<Address>,
    /// Decoded revert reason observed along the way, if any
    pub revert_reason: Option<String>,
    /// Receipt data when the figure comes from a real transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionOutcome>,
}

impl MeasurementResult {
    /// Successful measurement at the mode's nominal confidence
    pub fn measured(mode: Mode, gas_used: u64) -> Self {
        Self {
            success: true,
            gas_used,
            base_gas: gas_used,
            sponsor_overhead: 0,
            confidence: mode.nominal_confidence(),
            mode,
            used_fallback: false,
            attempts: Vec::new(),
            exploratory: mode.is_exploratory(),
            sender: None,
            revert_reason: None,
            transaction: None,
        }
    }

    /// Adds sponsor overhead on top of the base figure
    pub fn with_sponsor_overhead(mut self, overhead: u64) -> Self {
        self.sponsor_overhead = overhead;
        self.gas_used = self.base_gas.saturating_add(overhead);
        self
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_revert_reason(mut self, reason: Option<String>) -> Self {
        self.revert_reason = reason;
        self
    }

    pub fn with_transaction(mut self, outcome: TransactionOutcome) -> Self {
        self.transaction = Some(outcome);
        self
    }
}

/// One execution of a function within a profiling session
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// Zero-based index of the run
    pub run_index: usize,
    pub measurement: MeasurementResult,
    /// Unix time in milliseconds at which the run started
    pub started_at_ms: u64,
    pub duration_ms: u64,
    /// Hash of the real transaction, if one was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Unit price used for the cost, in wei per gas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<u128>,
    /// Monetary cost in wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<U256>,
}

impl RunRecord {
    pub fn gas_used(&self) -> u64 {
        self.measurement.gas_used
    }
}

/// Cost statistics in wei, present only when pricing data exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostSummary {
    pub min_cost: U256,
    pub max_cost: U256,
    pub avg_cost: U256,
    pub total_cost: U256,
}

/// Spread of gas usage across runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyRating {
    /// Spread under 5% of the average
    Excellent,
    /// Spread under 15%
    Good,
    /// Spread under 30%
    Fair,
    /// Anything wider
    Variable,
}

impl fmt::Display for EfficiencyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EfficiencyRating::Excellent => "excellent",
            EfficiencyRating::Good => "good",
            EfficiencyRating::Fair => "fair",
            EfficiencyRating::Variable => "variable",
        };
        f.write_str(label)
    }
}

/// Summary statistics of every run of one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedStats {
    pub min: u64,
    pub max: u64,
    pub avg: u64,
    /// Exact sum of every run's gas
    pub total: u128,
    pub call_count: usize,
    pub efficiency: EfficiencyRating,
    /// Rounded mean confidence of the runs
    pub average_confidence: u8,
    /// Number of runs that needed a fallback strategy
    pub fallback_runs: usize,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostSummary>,
}

/// Token configuration including symbol and decimals
#[derive(Debug, Clone, Serialize)]
pub struct TokenConfig {
    /// Token symbol (e.g., "ETH", "MATIC")
    pub symbol: String,
    /// Number of decimal places
    pub decimals: u8,
}

/// Get default native token configuration for known chains
pub fn get_default_native_token(chain_id: u64) -> TokenConfig {
    match chain_id {
        1 => TokenConfig { symbol: "ETH".into(), decimals: 18 },
        10 => TokenConfig { symbol: "OPT_ETH".into(), decimals: 18 },
        56 => TokenConfig { symbol: "BNB".into(), decimals: 18 },
        137 => TokenConfig { symbol: "MATIC".into(), decimals: 18 },
        8453 => TokenConfig { symbol: "BASE_ETH".into(), decimals: 18 },
        42161 => TokenConfig { symbol: "ARB_ETH".into(), decimals: 18 },
        11155111 => TokenConfig { symbol: "SEP_ETH".into(), decimals: 18 },
        // Default to ETH configuration for unknown chains
        _ => TokenConfig { symbol: "ETH".into(), decimals: 18 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tag_roundtrip() {
        for mode in Mode::ALL {
            assert_eq!(mode.tag().parse::<Mode>().unwrap(), mode);
        }
        assert!("warp-drive".parse::<Mode>().is_err());
    }

    #[test]
    fn test_sponsor_overhead_adds_to_base() {
        let result = MeasurementResult::measured(Mode::Estimate, 50_000).with_sponsor_overhead(50_000);
        assert_eq!(result.base_gas, 50_000);
        assert_eq!(result.gas_used, 100_000);
        assert_eq!(result.sponsor_overhead, 50_000);
    }

    #[test]
    fn test_exploratory_modes() {
        assert!(MeasurementResult::measured(Mode::MultiSender, 1).exploratory);
        assert!(!MeasurementResult::measured(Mode::Trace, 1).exploratory);
    }
}
