//! Utility functions for contract call preparation and diagnostics
//!
//! # Modules
//!
//! - [`error_utils`]: Revert payload decoding
//!   - `Error(string)` reasons
//!   - Solidity panic code interpretation
//!   - Custom error selectors
//!
//! - [`proxy_utils`]: Proxy contract analysis
//!   - Implementation contract resolution
//!   - Common proxy pattern detection (EIP-1967, EIP-1822, OpenZeppelin)
//!
//! - [`abi_utils`]: Argument handling
//!   - Coercion of JSON arguments to ABI values
//!   - Canonical argument encoding for fingerprints
//!   - Plausible default arguments per ABI type

/// Error parsing utilities
pub mod error_utils;

/// Proxy contract analysis utilities
pub mod proxy_utils;

/// ABI argument utilities
pub mod abi_utils;

/// Milliseconds since the Unix epoch
pub(crate) fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
