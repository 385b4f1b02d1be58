//! ABI argument utilities
//!
//! Arguments travel through the profiler as JSON values (one per function
//! input) so advisors and configuration files can supply them. This module
//! turns them into calldata:
//! - Tuple arguments may be given as arrays or as objects keyed by component name
//! - Numbers may be JSON numbers or decimal/hex strings
//! - Encoding is canonical, so equal arguments always produce equal calldata

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, Param, StateMutability};
use alloy::primitives::{Address, Bytes};
use serde_json::Value;

use crate::errors::ProfileError;

/// Parses a human-readable signature such as `"transfer(address,uint256)"`
/// or `"function balanceOf(address) view returns (uint256)"`
pub fn parse_function(signature: &str) -> Result<Function, ProfileError> {
    Function::parse(signature).map_err(|e| ProfileError::Abi(format!("invalid signature `{}`: {}", signature, e)))
}

/// Whether the function is declared `view` or `pure`
pub fn is_read_only(function: &Function) -> bool {
    matches!(function.state_mutability, StateMutability::View | StateMutability::Pure)
}

/// ABI-encodes `args` as calldata for `function`, selector included
pub fn encode_call(function: &Function, args: &[Value]) -> Result<Bytes, ProfileError> {
    if args.len() != function.inputs.len() {
        return Err(ProfileError::Abi(format!(
            "{} expects {} arguments, got {}",
            function.signature(),
            function.inputs.len(),
            args.len()
        )));
    }

    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| coerce_arg(param, arg))
        .collect::<Result<Vec<DynSolValue>, ProfileError>>()?;

    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| ProfileError::Abi(format!("cannot encode {}: {}", function.signature(), e)))
}

/// Converts one JSON argument into a typed ABI value
pub fn coerce_arg(param: &Param, arg: &Value) -> Result<DynSolValue, ProfileError> {
    let selector_type = param.selector_type();
    let ty = DynSolType::parse(&selector_type)
        .map_err(|e| ProfileError::Abi(format!("unsupported type `{}`: {}", selector_type, e)))?;
    let rendered = render(arg, &param.ty, &param.components, false);
    ty.coerce_str(&rendered).map_err(|e| {
        ProfileError::Abi(format!(
            "argument `{}` is not a valid {}: {}",
            rendered, selector_type, e
        ))
    })
}

/// Renders a JSON value in the textual form accepted by `DynSolType::coerce_str`
fn render(value: &Value, ty: &str, components: &[Param], nested: bool) -> String {
    if let Some(element_ty) = array_element_type(ty) {
        let items = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| render(item, element_ty, components, true))
                .collect::<Vec<_>>(),
            other => vec![render(other, element_ty, components, true)],
        };
        return format!("[{}]", items.join(","));
    }

    if ty == "tuple" {
        let fields = match value {
            Value::Array(items) => items
                .iter()
                .zip(components)
                .map(|(item, component)| render(item, &component.ty, &component.components, true))
                .collect::<Vec<_>>(),
            Value::Object(map) => components
                .iter()
                .map(|component| {
                    let field = map.get(&component.name).unwrap_or(&Value::Null);
                    render(field, &component.ty, &component.components, true)
                })
                .collect(),
            _ => Vec::new(),
        };
        return format!("({})", fields.join(","));
    }

    match value {
        Value::String(s) if nested && ty == "string" => format!("\"{}\"", s.replace('"', "\\\"")),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `"uint256[][3]"` -> `Some("uint256[]")`
fn array_element_type(ty: &str) -> Option<&str> {
    if !ty.ends_with(']') {
        return None;
    }
    ty.rfind('[').map(|idx| &ty[..idx])
}

/// Plausible argument for every input of `function`
///
/// Addresses default to `sender`, integers to 1, strings to a short word.
/// The result always encodes, which is all the profiler needs from it.
pub fn default_args(function: &Function, sender: Address) -> Vec<Value> {
    function
        .inputs
        .iter()
        .map(|param| {
            DynSolType::parse(&param.selector_type())
                .map(|ty| default_value(&ty, sender))
                .unwrap_or(Value::Null)
        })
        .collect()
}

fn default_value(ty: &DynSolType, sender: Address) -> Value {
    match ty {
        DynSolType::Address => Value::String(sender.to_string()),
        DynSolType::Bool => Value::Bool(false),
        DynSolType::Int(_) | DynSolType::Uint(_) => Value::String("1".into()),
        DynSolType::FixedBytes(size) => Value::String(format!("0x{}", "00".repeat(*size))),
        DynSolType::Bytes => Value::String("0x".into()),
        DynSolType::String => Value::String("profile".into()),
        DynSolType::Function => Value::String(format!("0x{}", "00".repeat(24))),
        DynSolType::Array(_) => Value::Array(Vec::new()),
        DynSolType::FixedArray(inner, len) => {
            Value::Array((0..*len).map(|_| default_value(inner, sender)).collect())
        }
        DynSolType::Tuple(items) => Value::Array(items.iter().map(|item| default_value(item, sender)).collect()),
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    #[test]
    fn test_encode_transfer() {
        let function = parse_function("transfer(address,uint256)").unwrap();
        let data = encode_call(
            &function,
            &[json!("0x000000000000000000000000000000000000dEaD"), json!(1000)],
        )
        .unwrap();
        assert_eq!(&data[..4], function.selector().as_slice());
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_number_forms_are_canonical() {
        let function = parse_function("set(uint256)").unwrap();
        let a = encode_call(&function, &[json!(255)]).unwrap();
        let b = encode_call(&function, &[json!("255")]).unwrap();
        let c = encode_call(&function, &[json!("0xff")]).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_tuple_object_key_order_is_irrelevant() {
        let function = parse_function("function submit((uint256 amount, address to) order)").unwrap();
        let a = encode_call(
            &function,
            &[json!({ "amount": 7, "to": "0x000000000000000000000000000000000000dEaD" })],
        )
        .unwrap();
        let b = encode_call(
            &function,
            &[json!({ "to": "0x000000000000000000000000000000000000dEaD", "amount": 7 })],
        )
        .unwrap();
        let c = encode_call(&function, &[json!([7, "0x000000000000000000000000000000000000dEaD"])]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_arity_mismatch() {
        let function = parse_function("transfer(address,uint256)").unwrap();
        assert!(matches!(encode_call(&function, &[json!(1)]), Err(ProfileError::Abi(_))));
    }

    #[test]
    fn test_default_args_always_encode() {
        let sender = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        for signature in [
            "transfer(address,uint256)",
            "function mint(address to, uint256[] ids, bytes data)",
            "function configure(bytes32 key, bool enabled, string label, uint8[3] weights)",
        ] {
            let function = parse_function(signature).unwrap();
            let args = default_args(&function, sender);
            assert!(encode_call(&function, &args).is_ok(), "{}", signature);
        }
    }

    #[test]
    fn test_read_only_detection() {
        assert!(is_read_only(&parse_function("function get() view returns (uint256)").unwrap()));
        assert!(!is_read_only(&parse_function("function set(uint256 x)").unwrap()));
    }
}
