//! Name-based gas guesses, the last resort of gasless sessions
//!
//! LOW CONFIDENCE. These figures are typical costs of common function names
//! on mainnet token and DeFi contracts. They are never measured, never cached
//! and always reported with `success = false`.

use alloy::json_abi::Function;

use crate::types::{MeasurementResult, Mode};
use crate::utils::abi_utils::is_read_only;

/// Confidence when the name matched a table entry
pub const MATCHED_CONFIDENCE: u8 = 10;

/// Confidence of the generic fallback figure
pub const UNMATCHED_CONFIDENCE: u8 = 5;

/// Typical cost of a view function
pub const VIEW_GAS: u64 = 30_000;

const GENERIC_BASE_GAS: u64 = 50_000;
const GENERIC_PER_PARAM_GAS: u64 = 5_000;

/// Name fragment -> typical gas, checked in order (`transferfrom` before `transfer`)
pub const NAME_TABLE: &[(&str, u64)] = &[
    ("transferfrom", 65_000),
    ("transfer", 51_000),
    ("approve", 46_000),
    ("mint", 70_000),
    ("burn", 40_000),
    ("swap", 150_000),
    ("deposit", 60_000),
    ("withdraw", 60_000),
    ("stake", 90_000),
    ("claim", 80_000),
    ("vote", 70_000),
    ("create", 200_000),
    ("deploy", 200_000),
    ("set", 45_000),
];

/// Table entry matching `name`, case-insensitively
pub fn lookup(name: &str) -> Option<u64> {
    let lower = name.to_lowercase();
    NAME_TABLE
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, gas)| *gas)
}

/// Synthetic result for `function`
pub fn guess(function: &Function) -> MeasurementResult {
    let (gas, confidence) = match lookup(&function.name) {
        Some(gas) => (gas, MATCHED_CONFIDENCE),
        None if is_read_only(function) => (VIEW_GAS, UNMATCHED_CONFIDENCE),
        None => (
            GENERIC_BASE_GAS + GENERIC_PER_PARAM_GAS * function.inputs.len() as u64,
            UNMATCHED_CONFIDENCE,
        ),
    };

    let mut result = MeasurementResult::measured(Mode::NameHeuristic, gas).with_confidence(confidence);
    result.success = false;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::abi_utils::parse_function;

    #[test]
    fn test_lookup_order() {
        assert_eq!(lookup("transferFrom"), Some(65_000));
        assert_eq!(lookup("safeTransferFrom"), Some(65_000));
        assert_eq!(lookup("transfer"), Some(51_000));
        assert_eq!(lookup("setOwner"), Some(45_000));
        assert_eq!(lookup("rebalance"), None);
    }

    #[test]
    fn test_guess_is_unsuccessful_and_low_confidence() {
        let result = guess(&parse_function("function swapExactTokensForTokens(uint256,uint256,address[],address,uint256)").unwrap());
        assert!(!result.success);
        assert_eq!(result.mode, Mode::NameHeuristic);
        assert_eq!(result.gas_used, 150_000);
        assert!(result.confidence <= 10);

        let generic = guess(&parse_function("function rebalance(uint256,uint256)").unwrap());
        assert_eq!(generic.gas_used, 60_000);
        assert_eq!(generic.confidence, UNMATCHED_CONFIDENCE);

        let view = guess(&parse_function("function total() view returns (uint256)").unwrap());
        assert_eq!(view.gas_used, VIEW_GAS);
    }
}
