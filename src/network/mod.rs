//! Network handle backed by an alloy provider
//!
//! [`AlloyNetwork`] implements [`NetworkHandle`] over HTTP or WebSocket
//! JSON-RPC endpoints:
//!
//! | Capability | RPC method |
//! |---|---|
//! | `estimate_gas` | `eth_estimateGas` |
//! | `simulate_read_only` | `eth_call` |
//! | `trace_call` | `debug_traceCall` |
//! | `fetch_unit_price` | `eth_gasPrice` |
//! | `get_deployed_code` | `eth_getCode` |
//! | `get_storage_at` | `eth_getStorageAt` |
//! | `submit_transaction` | `eth_sendTransaction` (node-managed accounts) |
//!
//! Node errors are classified so the orchestrator can tell a revert (code 3,
//! revert data, "execution reverted") from a missing capability (`-32601`,
//! "not supported").
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use evm_gas_profile::network::AlloyNetwork;
//! let network = AlloyNetwork::connect("https://eth.llamarpc.com").await?;
//! # Ok(())
//! # }
//! ```

use alloy::{
    eips::BlockId,
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::{ext::DebugApi, DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::types::{
        trace::geth::{GethDebugTracingCallOptions, GethTrace},
        TransactionRequest,
    },
    transports::{RpcError, TransportErrorKind},
};
use async_trait::async_trait;
use log::debug;

use crate::{
    errors::{NetworkError, ProfileError},
    traits::NetworkHandle,
    types::{CallRequest, TraceSummary, TransactionOutcome},
    utils::error_utils::decode_revert_reason,
};

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// Code geth attaches to reverted calls and estimates
const EXECUTION_REVERTED: i64 = 3;

const REVERT_PREFIX: &str = "execution reverted:";

/// Messages nodes return for disabled namespaces
const UNSUPPORTED_MARKERS: &[&str] = &[
    "method not found",
    "not supported",
    "does not exist",
    "not available",
    "unsupported",
    "namespace is disabled",
];

/// Network handle over an alloy provider
#[derive(Clone)]
pub struct AlloyNetwork {
    provider: DynProvider,
}

impl AlloyNetwork {
    /// Wraps an already configured provider
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    /// Connects to `rpc_url`, using WebSocket for `ws://`/`wss://` URLs and HTTP otherwise
    pub async fn connect(rpc_url: &str) -> Result<Self, ProfileError> {
        let provider = if rpc_url.starts_with("http") {
            let url = rpc_url
                .parse()
                .map_err(|_| ProfileError::Config(format!("Failed to parse RPC URL {}", rpc_url)))?;
            ProviderBuilder::new().connect_http(url).erased()
        } else {
            let ws_connect = WsConnect::new(rpc_url);
            ProviderBuilder::new()
                .connect_ws(ws_connect)
                .await
                .map_err(|e| ProfileError::Config(format!("Failed to connect to WebSocket {}: {}", rpc_url, e)))?
                .erased()
        };
        Ok(Self { provider })
    }

    /// Underlying provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

fn to_request(call: &CallRequest) -> TransactionRequest {
    let mut tx = TransactionRequest::default()
        .with_to(call.to)
        .with_input(call.data.clone())
        .with_value(call.value);
    if let Some(from) = call.from {
        tx = tx.with_from(from);
    }
    if let Some(gas) = call.gas {
        tx = tx.with_gas_limit(gas);
    }
    tx
}

/// Classifies a JSON-RPC error
fn map_rpc_error(capability: &str, err: RpcError<TransportErrorKind>) -> NetworkError {
    match err.as_error_resp() {
        Some(payload) => classify(capability, payload.code, &payload.message, payload.as_revert_data()),
        None => NetworkError::Transport(format!("{}: {}", capability, err)),
    }
}

/// Reverts are recognised before missing capabilities, so a revert reason
/// such as "token does not exist" stays a revert
fn classify(capability: &str, code: i64, message: &str, data: Option<Bytes>) -> NetworkError {
    let lower = message.to_lowercase();

    if code == EXECUTION_REVERTED || data.is_some() || lower.contains("revert") {
        let reason = data
            .as_ref()
            .and_then(|data| decode_revert_reason(data))
            .or_else(|| {
                lower
                    .find(REVERT_PREFIX)
                    .and_then(|idx| message.get(idx + REVERT_PREFIX.len()..))
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .map(str::to_string)
            });
        return NetworkError::Reverted { reason, data };
    }

    if code == METHOD_NOT_FOUND || UNSUPPORTED_MARKERS.iter().any(|m| lower.contains(m)) {
        return NetworkError::Unsupported(format!("{}: {}", capability, message));
    }

    NetworkError::Transport(format!("{}: {}", capability, message))
}

#[async_trait]
impl NetworkHandle for AlloyNetwork {
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, NetworkError> {
        self.provider
            .estimate_gas(to_request(call))
            .await
            .map_err(|e| map_rpc_error("eth_estimateGas", e))
    }

    async fn simulate_read_only(&self, call: &CallRequest) -> Result<Bytes, NetworkError> {
        self.provider
            .call(to_request(call))
            .await
            .map_err(|e| map_rpc_error("eth_call", e))
    }

    async fn trace_call(&self, call: &CallRequest) -> Result<TraceSummary, NetworkError> {
        let trace = self
            .provider
            .debug_trace_call(to_request(call), BlockId::latest(), GethDebugTracingCallOptions::default())
            .await
            .map_err(|e| map_rpc_error("debug_traceCall", e))?;

        match trace {
            GethTrace::Default(frame) => Ok(TraceSummary {
                gas_used: frame.gas,
                failed: frame.failed,
                steps: Some(frame.struct_logs.len()),
            }),
            GethTrace::CallTracer(frame) => Ok(TraceSummary {
                gas_used: frame.gas_used.saturating_to(),
                failed: frame.error.is_some(),
                steps: None,
            }),
            _ => Err(NetworkError::Unsupported(
                "debug_traceCall: unexpected tracer output".into(),
            )),
        }
    }

    async fn fetch_unit_price(&self) -> Result<u128, NetworkError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| map_rpc_error("eth_gasPrice", e))
    }

    async fn get_deployed_code(&self, address: Address) -> Result<Bytes, NetworkError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| map_rpc_error("eth_getCode", e))
    }

    async fn get_storage_at(&self, address: Address, slot: U256) -> Result<U256, NetworkError> {
        self.provider
            .get_storage_at(address, slot)
            .await
            .map_err(|e| map_rpc_error("eth_getStorageAt", e))
    }

    async fn submit_transaction(&self, call: &CallRequest) -> Result<TransactionOutcome, NetworkError> {
        let pending = self
            .provider
            .send_transaction(to_request(call))
            .await
            .map_err(|e| map_rpc_error("eth_sendTransaction", e))?;
        debug!("submitted transaction {}", pending.tx_hash());
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| NetworkError::Transport(format!("receipt: {}", e)))?;

        Ok(TransactionOutcome {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            success: receipt.status(),
        })
    }

    async fn chain_id(&self) -> Result<u64, NetworkError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| map_rpc_error("eth_chainId", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex::decode;

    #[test]
    fn test_revert_reason_mentioning_missing_things_is_a_revert() {
        let err = classify(
            "eth_call",
            EXECUTION_REVERTED,
            "execution reverted: ERC721: token does not exist",
            None,
        );
        match err {
            NetworkError::Reverted { reason, data } => {
                assert_eq!(reason.as_deref(), Some("ERC721: token does not exist"));
                assert!(data.is_none());
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_revert_data_takes_precedence_over_message() {
        // Ownable: caller is not the owner, OpenZeppelin v5 style
        let data = Bytes::from(decode("118cdaa7000000000000000000000000000000000000000000000000000000000000dead").unwrap());
        let err = classify("eth_estimateGas", EXECUTION_REVERTED, "execution reverted", Some(data.clone()));
        match err {
            NetworkError::Reverted { reason, data: carried } => {
                assert_eq!(reason.as_deref(), Some("OwnableUnauthorizedAccount"));
                assert_eq!(carried, Some(data));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_missing_capability() {
        assert!(matches!(
            classify("debug_traceCall", METHOD_NOT_FOUND, "the method debug_traceCall does not exist/is not available", None),
            NetworkError::Unsupported(_)
        ));
        assert!(matches!(
            classify("debug_traceCall", -32000, "namespace is disabled", None),
            NetworkError::Unsupported(_)
        ));
        assert!(matches!(
            classify("eth_call", -32000, "header not found", None),
            NetworkError::Transport(_)
        ));
    }
}
