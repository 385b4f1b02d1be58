//! Profiler configuration
//!
//! Provides:
//! - Session parameters (run count, gasless vs. fee-paying)
//! - Attempt deadline and inter-run pacing
//! - Result cache sizing
//! - Cost display precision
//!
//! Values can be loaded from a JSON file; every field has a default so a
//! partial file is accepted.

use std::path::Path;
use std::time::Duration;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::errors::ProfileError;
use crate::types::Mode;

/// Default deadline for a single strategy attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default lifetime of a cached measurement
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default number of cached measurements before an oldest-first sweep
pub const DEFAULT_CACHE_CAPACITY: usize = 1_000;

/// Default pause between consecutive runs of the same function
pub const DEFAULT_INTER_RUN_DELAY: Duration = Duration::from_millis(250);

/// Profiler configuration parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// RPC endpoint URL (http(s) or ws(s))
    pub rpc_url: Option<String>,
    /// Number of runs per function
    pub runs: usize,
    /// Simulate only; `false` sends real fee-paying transactions
    pub gasless: bool,
    /// Deadline for each strategy attempt
    #[serde(with = "duration_secs")]
    pub attempt_timeout: Duration,
    /// Pause between consecutive runs
    #[serde(with = "duration_millis")]
    pub inter_run_delay: Duration,
    /// Lifetime of cached measurements
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Entry count that triggers an oldest-first sweep
    pub cache_capacity: usize,
    /// Whether simulated measurements are memoized
    pub use_cache: bool,
    /// Decimal places shown for native-token costs
    pub price_precision: u32,
    /// Extra gas limit added to real transactions, in percent of the estimate
    pub gas_limit_buffer_percent: u64,
    /// Mode forced as primary instead of the selector's choice
    pub mode: Option<Mode>,
    /// Fee sponsor (paymaster) applied to every call
    pub sponsor: Option<Address>,
    /// Sender applied to every call
    pub sender: Option<Address>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            runs: 3,
            gasless: true,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            inter_run_delay: DEFAULT_INTER_RUN_DELAY,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            use_cache: true,
            price_precision: 9,
            gas_limit_buffer_percent: 20,
            mode: None,
            sponsor: None,
            sender: None,
        }
    }
}

impl ProfilerConfig {
    /// Loads a configuration from a JSON file and validates it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ProfileError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Parses a configuration from JSON text and validates it
    pub fn from_json_str(raw: &str) -> Result<Self, ProfileError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ProfileError::Config(format!("malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.runs == 0 {
            return Err(ProfileError::Config("runs must be at least 1".into()));
        }
        if self.attempt_timeout.is_zero() {
            return Err(ProfileError::Config("attempt_timeout must be positive".into()));
        }
        if self.cache_capacity == 0 {
            return Err(ProfileError::Config("cache_capacity must be at least 1".into()));
        }
        if self.price_precision > 18 {
            return Err(ProfileError::Config("price_precision cannot exceed 18".into()));
        }
        if !self.gasless && matches!(self.mode, Some(mode) if mode != Mode::Direct) {
            return Err(ProfileError::Config(
                "fee-paying sessions only support the direct mode".into(),
            ));
        }
        Ok(())
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_gasless(mut self, gasless: bool) -> Self {
        self.gasless = gasless;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_inter_run_delay(mut self, delay: Duration) -> Self {
        self.inter_run_delay = delay;
        self
    }

    pub fn with_cache(mut self, ttl: Duration, capacity: usize) -> Self {
        self.cache_ttl = ttl;
        self.cache_capacity = capacity;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_sponsor(mut self, sponsor: Address) -> Self {
        self.sponsor = Some(sponsor);
        self
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
