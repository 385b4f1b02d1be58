//! Revert payload decoding
//!
//! This module decodes the payload returned by a reverted call:
//! - Standard revert messages (Error(string))
//! - Solidity panic codes (Panic(uint256))
//! - Well-known custom errors (OpenZeppelin v5 access guards), by name
//! - Other custom error selectors, reported by selector
//!
//! Common revert scenarios that this module handles:
//! - `require` with a message
//! - Assertion failures
//! - Arithmetic overflow and division by zero
//! - Array bounds checks

use alloy::dyn_abi::{DynSolType, DynSolValue};

/// `Error(string)`
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// `Panic(uint256)`
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Solidity panic codes
const PANIC_REASONS: &[(u64, &str)] = &[
    (0x01, "Assertion failed"),
    (0x11, "Arithmetic overflow"),
    (0x12, "Division by zero"),
    (0x21, "Invalid enum value"),
    (0x22, "Invalid storage byte array"),
    (0x31, "Pop on empty array"),
    (0x32, "Array access out of bounds"),
    (0x41, "Out of memory"),
    (0x51, "Invalid internal function"),
];

/// Custom errors recognised by selector
const KNOWN_CUSTOM_ERRORS: &[([u8; 4], &str)] = &[
    // OwnableUnauthorizedAccount(address)
    ([0x11, 0x8c, 0xda, 0xa7], "OwnableUnauthorizedAccount"),
    // AccessControlUnauthorizedAccount(address,bytes32)
    ([0xe2, 0x51, 0x7d, 0x3f], "AccessControlUnauthorizedAccount"),
    // Unauthorized()
    ([0x82, 0xb4, 0x29, 0x00], "Unauthorized"),
];

/// Name of a well-known custom error
pub fn known_custom_error(output: &[u8]) -> Option<&'static str> {
    let (selector, _) = output.split_first_chunk::<4>()?;
    KNOWN_CUSTOM_ERRORS
        .iter()
        .find(|(known, _)| known == selector)
        .map(|(_, name)| *name)
}

/// Decodes the two standard revert formats
///
/// # Returns
/// * `Some(String)` - The `Error(string)` message, or a `Panic: ...` description
/// * `None` - Any other payload, or a standard selector with a malformed body
pub fn decode_standard_revert(output: &[u8]) -> Option<String> {
    let (selector, body) = output.split_first_chunk::<4>()?;
    match *selector {
        ERROR_SELECTOR => match DynSolType::String.abi_decode(body).ok()? {
            DynSolValue::String(reason) => Some(reason),
            _ => None,
        },
        PANIC_SELECTOR => {
            let DynSolValue::Uint(code, _) = DynSolType::Uint(256).abi_decode(body).ok()? else {
                return None;
            };
            let code = code.saturating_to::<u64>();
            let reason = PANIC_REASONS
                .iter()
                .find(|(known, _)| *known == code)
                .map(|(_, reason)| reason.to_string())
                .unwrap_or_else(|| format!("Unknown error code (0x{:x})", code));
            Some(format!("Panic: {}", reason))
        }
        _ => None,
    }
}

/// Decode any revert payload, falling back to the custom error name or selector
///
/// Returns `None` for empty payloads (plain `revert()`).
pub fn decode_revert_reason(output: &[u8]) -> Option<String> {
    if output.is_empty() {
        return None;
    }
    decode_standard_revert(output)
        .or_else(|| known_custom_error(output).map(str::to_string))
        .or_else(|| {
            if output.len() >= 4 {
                Some(format!("Custom error 0x{}", alloy::hex::encode(&output[0..4])))
            } else {
                Some(format!("Malformed revert data 0x{}", alloy::hex::encode(output)))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex::decode;

    #[test]
    fn test_parse_error_string() {
        // "Insufficient balance" encoded as Error(string)
        let error_bytes = decode(
            "08c379a0\
             0000000000000000000000000000000000000000000000000000000000000020\
             0000000000000000000000000000000000000000000000000000000000000014\
             496e73756666696369656e742062616c616e6365000000000000000000000000",
        )
        .unwrap();

        let result = decode_standard_revert(&error_bytes);
        assert_eq!(result, Some("Insufficient balance".to_string()));

        // Selector without payload is not decodable
        let invalid_bytes = decode("08c379a0").unwrap();
        assert_eq!(decode_standard_revert(&invalid_bytes), None);
    }

    #[test]
    fn test_parse_panic() {
        let panic_codes = [
            (0x01, "Panic: Assertion failed"),
            (0x11, "Panic: Arithmetic overflow"),
            (0x12, "Panic: Division by zero"),
            (0x32, "Panic: Array access out of bounds"),
            (0xFF, "Panic: Unknown error code (0xff)"),
        ];

        for (code, expected_message) in panic_codes {
            let mut panic_bytes = vec![0x4e, 0x48, 0x7b, 0x71];
            let mut word = [0u8; 32];
            word[31] = code as u8;
            panic_bytes.extend_from_slice(&word);

            let result = decode_standard_revert(&panic_bytes);
            assert_eq!(result, Some(expected_message.to_string()));
        }
    }

    #[test]
    fn test_known_custom_errors() {
        let owner_guard = decode("118cdaa70000000000000000000000000000000000000000000000000000000000000000").unwrap();
        assert_eq!(decode_revert_reason(&owner_guard), Some("OwnableUnauthorizedAccount".to_string()));
        let role_guard = decode(
            "e2517d3f\
             0000000000000000000000000000000000000000000000000000000000000001\
             0000000000000000000000000000000000000000000000000000000000000000",
        )
        .unwrap();
        assert_eq!(decode_revert_reason(&role_guard), Some("AccessControlUnauthorizedAccount".to_string()));
        assert_eq!(decode_revert_reason(&decode("82b42900").unwrap()), Some("Unauthorized".to_string()));
    }

    #[test]
    fn test_custom_error_fallback() {
        let payload = decode("cf479181").unwrap();
        assert_eq!(decode_revert_reason(&payload), Some("Custom error 0xcf479181".to_string()));
        assert_eq!(decode_revert_reason(&[]), None);
        assert_eq!(decode_revert_reason(&[0x01, 0x02]), Some("Malformed revert data 0x0102".to_string()));
    }
}
