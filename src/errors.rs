//! Error types for gas measurement and profiling
//!
//! This module defines the error handling system of the profiler:
//! - Network handle errors (transport, unsupported capability, reverts)
//! - Strategy-level errors raised by individual measurement executors
//! - Session-level errors that surface to the caller
//!
//! Strategy errors are always absorbed by the fallback orchestrator. Only
//! [`ProfileError`] crosses the public API boundary.

use alloy::primitives::{Address, Bytes};
use thiserror::Error;

use crate::types::{Attempt, Mode};

/// Top-level error type for profiling sessions
///
/// Encompasses everything that can abort a measurement or a whole session.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Every strategy of the fallback chain failed for a fee-paying call
    ///
    /// # Fields
    /// * `function` - Signature of the function being measured
    /// * `attempts` - Ordered list of attempted modes and their errors
    #[error("All strategies exhausted for {function} after {} attempts", attempts.len())]
    AllStrategiesExhausted {
        function: String,
        attempts: Vec<Attempt>,
    },

    /// A real transaction was sent but did not succeed
    #[error("Transaction failed for {function}: {reason}")]
    TransactionFailed {
        function: String,
        reason: String,
    },

    /// Function signature or argument encoding problems
    #[error("ABI error: {0}")]
    Abi(String),

    /// Invalid profiler configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Errors raised while talking to the network outside of a strategy
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Session export failures
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Strategy errors surfaced outside of the orchestrator
    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

/// Errors returned by a [`NetworkHandle`](crate::traits::NetworkHandle)
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// The endpoint does not implement the requested capability
    #[error("Capability not supported by endpoint: {0}")]
    Unsupported(String),

    /// The call reverted during evaluation
    ///
    /// # Fields
    /// * `reason` - Decoded revert reason, if any
    /// * `data` - Raw revert payload, if returned by the node
    #[error("Execution reverted: {}", reason.as_deref().unwrap_or("<no reason>"))]
    Reverted {
        reason: Option<String>,
        data: Option<Bytes>,
    },

    /// Transport, serialization or node-side failures
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors raised by a single measurement strategy
#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    /// Static evaluation detected that the call reverts with these arguments
    #[error("Call would revert: {reason}")]
    WouldRevert {
        reason: String,
    },

    /// The mode is unavailable on this endpoint or not registered
    #[error("Mode {mode} unsupported: {reason}")]
    UnsupportedMode {
        mode: Mode,
        reason: String,
    },

    /// The fee sponsor failed interface or balance validation
    #[error("Sponsor {sponsor} failed validation: {reason}")]
    SponsorValidation {
        sponsor: Address,
        reason: String,
    },

    /// The strategy ran but could not produce a measurement
    #[error("{0}")]
    Execution(String),

    /// The attempt exceeded its deadline
    #[error("Mode {mode} timed out after {seconds}s")]
    Timeout {
        mode: Mode,
        seconds: u64,
    },

    /// Underlying network handle failure
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl StrategyError {
    /// Whether this failure looks like a sender restriction (owner or role checks)
    pub fn is_permission_error(&self) -> bool {
        is_permission_message(&self.to_string())
    }

    /// Whether the endpoint lacks the capability rather than the call failing
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            StrategyError::UnsupportedMode { .. } | StrategyError::Network(NetworkError::Unsupported(_))
        )
    }
}

/// Substrings emitted by common access-control guards
const PERMISSION_MARKERS: &[&str] = &[
    "ownable",
    "not the owner",
    "not owner",
    "only owner",
    "onlyowner",
    "caller is not",
    "unauthorized",
    "accesscontrol",
    "access denied",
    "missing role",
    "forbidden",
    "not allowed",
    "permission",
];

/// Heuristic classification of an error message as a permission failure
pub fn is_permission_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    PERMISSION_MARKERS.iter().any(|marker| lower.contains(marker))
}
