//! Proxy contract analysis and implementation resolution
//!
//! This module provides utilities for:
//! - Detecting proxy contracts
//! - Resolving implementation addresses
//! - Supporting multiple proxy patterns:
//!   - EIP-1967 (Transparent Proxy)
//!   - EIP-1822 (UUPS Proxy)
//!   - OpenZeppelin Proxy
//!   - Beacon Proxy
//!
//! The bytecode heuristic uses this to analyze the logic contract instead of a
//! thin delegating proxy.

use alloy::primitives::{b256, Address, B256, U256};
use log::debug;

use crate::errors::NetworkError;
use crate::traits::NetworkHandle;

/// keccak256("eip1967.proxy.implementation") - 1
const EIP_1967_LOGIC_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// keccak256("eip1967.proxy.beacon") - 1
const EIP_1967_BEACON_SLOT: B256 =
    b256!("a3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50");

/// keccak256("org.zeppelinos.proxy.implementation")
const OZ_IMPLEMENTATION_SLOT: B256 =
    b256!("7050c9e0f4ca769c69bd3a8ef740bc37934f8e2c036e5a723fd8ee048ed3f8c3");

/// keccak256("PROXIABLE")
const EIP_1822_LOGIC_SLOT: B256 =
    b256!("c5f16f0fcc639fa48a6947836d9850f504798523bf8c9a3a87d5876cf622bcf7");

/// Storage slots checked in order
const IMPLEMENTATION_SLOTS: [B256; 4] = [
    EIP_1967_LOGIC_SLOT,
    EIP_1967_BEACON_SLOT,
    OZ_IMPLEMENTATION_SLOT,
    EIP_1822_LOGIC_SLOT,
];

/// Attempts to find the implementation address behind a proxy contract
///
/// # Arguments
/// * `network` - Network handle used for storage and code reads
/// * `proxy` - Address of the potential proxy contract
///
/// # Returns
/// * `Ok(Some(Address))` - Implementation address with deployed code
/// * `Ok(None)` - No implementation found (not a proxy, or storage reads unsupported)
/// * `Err(_)` - Transport failure while reading state
///
/// # Implementation Details
/// 1. Checks each known implementation slot in order
/// 2. For non-zero values, takes the low 20 bytes as an address
/// 3. Verifies the address has deployed code
/// 4. Returns the first valid implementation found
pub async fn get_implementation(
    network: &dyn NetworkHandle,
    proxy: Address,
) -> Result<Option<Address>, NetworkError> {
    for slot in IMPLEMENTATION_SLOTS {
        let value = match network.get_storage_at(proxy, U256::from_be_bytes(slot.0)).await {
            Ok(value) => value,
            Err(NetworkError::Unsupported(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        if value.is_zero() {
            continue;
        }
        let impl_address = Address::from_slice(&value.to_be_bytes::<32>()[12..32]);
        let code = network.get_deployed_code(impl_address).await?;
        if !code.is_empty() {
            debug!("{} delegates to implementation {}", proxy, impl_address);
            return Ok(Some(impl_address));
        }
    }

    Ok(None)
}
