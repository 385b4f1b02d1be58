//! # EVM Gas Profiler
//!
//! A library for measuring the gas cost of smart contract functions through a
//! JSON-RPC endpoint, with or without sending real transactions.
//!
//! ## Core Features
//!
//! - **Measurement Strategies**
//!   - Node-side estimation, static-call trial, execution tracing
//!   - Cross-validated multi-strategy measurement
//!   - Fee sponsor (paymaster) aware estimation
//!   - Bytecode analysis when nothing can be executed
//!
//! - **Fallback Orchestration**
//!   - Ordered fallback chain with per-attempt deadlines
//!   - Sender substitution for permission-guarded functions
//!   - Every attempt recorded on the result
//!
//! - **Profiling Sessions**
//!   - Repeated runs with min/max/average statistics
//!   - Monetary cost in native-token units
//!   - TTL-bounded result cache
//!
//! ## Features
//!
//! - `rustls-tls`: Uses rustls as the TLS implementation instead of native-tls (OpenSSL).
//!
//!   Usage example:
//!   ```toml
//!   [dependencies]
//!   evm-gas-profile = { version = "0.3.0", default-features = false, features = ["rustls-tls"] }
//!   ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use evm_gas_profile::{network::AlloyNetwork, FunctionCall, Profiler, ProfilerConfig};
//! use alloy::primitives::address;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let network = AlloyNetwork::connect("https://eth.llamarpc.com").await?;
//! let profiler = Profiler::new(Arc::new(network), ProfilerConfig::default())?;
//!
//! let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
//! let calls = [
//!     FunctionCall::parse("function totalSupply() view returns (uint256)")?,
//!     FunctionCall::parse("function approve(address spender, uint256 amount)")?,
//! ];
//!
//! let session = profiler.profile(usdc, &calls).await?;
//! for (signature, profile) in &session.functions {
//!     println!(
//!         "{}: avg {} gas, confidence {}%",
//!         signature, profile.stats.avg, profile.stats.average_confidence
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `strategy`: Measurement executors, mode selection and the mode registry
//! - `orchestrator`: Fallback chain over the registered executors
//! - `session`: Multi-run profiling of a contract
//! - `cache`: Measurement memoization
//! - `cost`: Wei cost computation and formatting
//! - `aggregator`: Run statistics
//! - `network`: Alloy-backed network handle
//! - `types`: Core data structures
//! - `traits`: Collaborator contracts (network, strategies, advisors, sponsors)
//! - `errors`: Error types
//! - `utils`: ABI, revert and proxy helpers

pub mod advisor;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod cost;
pub mod errors;
pub mod network;
pub mod orchestrator;
pub mod session;
pub mod strategy;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export only the essential types and functions
pub use cache::{CallFingerprint, ResultCache};
pub use config::ProfilerConfig;
pub use errors::{NetworkError, ProfileError, StrategyError};
pub use orchestrator::{MeasureRequest, Orchestrator};
pub use session::{FunctionCall, Profiler, ProfilingSession};
pub use strategy::{select_mode, ModeRegistry};
pub use traits::{ArgumentAdvisor, NetworkHandle, SponsorValidator, StrategyExecutor};
pub use types::{MeasurementResult, Mode};
