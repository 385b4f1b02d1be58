//! Monetary cost of measured gas
//!
//! Costs are computed in wei as `gas_used * unit_price` with 256-bit integer
//! arithmetic and rendered in native-token units with a fixed number of
//! decimals. Missing pricing data is not an error: the cost is simply absent.

use alloy::primitives::U256;
use log::warn;

use crate::traits::NetworkHandle;

/// Decimals of every supported native token
pub const NATIVE_DECIMALS: u32 = 18;

/// Cost in wei, `None` when the unit price is unknown
pub fn compute_cost(gas_used: u64, unit_price: Option<u128>) -> Option<U256> {
    unit_price.map(|price| U256::from(gas_used).saturating_mul(U256::from(price)))
}

/// Current unit price, or `None` (logged) when the endpoint cannot provide it
pub async fn fetch_unit_price(network: &dyn NetworkHandle) -> Option<u128> {
    match network.fetch_unit_price().await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("gas price unavailable, costs will be omitted: {}", e);
            None
        }
    }
}

/// Renders `wei` with `precision` decimals of a token with `decimals` decimals
///
/// Rounds half up. `precision` is capped at `decimals`.
///
/// ```
/// use alloy::primitives::U256;
/// use evm_gas_profile::cost::format_cost;
///
/// // 21000 gas at 1.5 gwei
/// assert_eq!(format_cost(U256::from(31_500_000_000_000u64), 18, 9), "0.000031500");
/// ```
pub fn format_cost(wei: U256, decimals: u32, precision: u32) -> String {
    let precision = precision.min(decimals);
    let scale = U256::from(10u64).pow(U256::from(decimals - precision));
    let half = scale / U256::from(2u64);
    let scaled = if scale == U256::from(1u64) {
        wei
    } else {
        wei.saturating_add(half) / scale
    };

    if precision == 0 {
        return scaled.to_string();
    }

    let unit = U256::from(10u64).pow(U256::from(precision));
    let whole = scaled / unit;
    let fraction = scaled % unit;
    format!("{}.{:0>width$}", whole, fraction.to_string(), width = precision as usize)
}

/// [`format_cost`] for native tokens with 18 decimals
pub fn format_native(wei: U256, precision: u32) -> String {
    format_cost(wei, NATIVE_DECIMALS, precision)
}
