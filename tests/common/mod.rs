//! Scripted network handle for integration tests
//!
//! Every capability returns a configured response and counts its calls, so
//! tests can assert both on results and on the network traffic they caused.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use evm_gas_profile::{
    errors::NetworkError,
    traits::NetworkHandle,
    types::{CallRequest, TraceSummary, TransactionOutcome},
};

#[derive(Debug, Default)]
pub struct CallCounters {
    pub estimate: AtomicUsize,
    pub simulate: AtomicUsize,
    pub trace: AtomicUsize,
    pub price: AtomicUsize,
    pub code: AtomicUsize,
    pub storage: AtomicUsize,
    pub submit: AtomicUsize,
}

pub struct MockNetwork {
    pub estimate: Result<u64, NetworkError>,
    pub estimate_by_sender: HashMap<Address, Result<u64, NetworkError>>,
    pub estimate_delay: Option<Duration>,
    pub simulate: Result<Bytes, NetworkError>,
    pub simulate_by_data: HashMap<Bytes, Bytes>,
    pub trace: Result<TraceSummary, NetworkError>,
    pub price: Result<u128, NetworkError>,
    pub code: HashMap<Address, Bytes>,
    pub receipt: Option<TransactionOutcome>,
    pub chain_id: Option<u64>,
    pub calls: CallCounters,
    /// Calldata of every trace request, in order
    pub traced: Mutex<Vec<Bytes>>,
}

pub fn unsupported(capability: &str) -> NetworkError {
    NetworkError::Unsupported(capability.to_string())
}

pub fn reverted(reason: &str) -> NetworkError {
    NetworkError::Reverted {
        reason: Some(reason.to_string()),
        data: None,
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            estimate: Ok(21_000),
            estimate_by_sender: HashMap::new(),
            estimate_delay: None,
            simulate: Ok(Bytes::new()),
            simulate_by_data: HashMap::new(),
            trace: Err(unsupported("debug_traceCall")),
            price: Err(unsupported("eth_gasPrice")),
            code: HashMap::new(),
            receipt: None,
            chain_id: Some(1),
            calls: CallCounters::default(),
            traced: Mutex::new(Vec::new()),
        }
    }
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estimate(mut self, estimate: Result<u64, NetworkError>) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn with_sender_estimate(mut self, sender: Address, estimate: Result<u64, NetworkError>) -> Self {
        self.estimate_by_sender.insert(sender, estimate);
        self
    }

    pub fn with_estimate_delay(mut self, delay: Duration) -> Self {
        self.estimate_delay = Some(delay);
        self
    }

    pub fn with_simulate(mut self, simulate: Result<Bytes, NetworkError>) -> Self {
        self.simulate = simulate;
        self
    }

    /// Fixed output for calls carrying exactly `data`
    pub fn with_call_output(mut self, data: impl Into<Bytes>, output: impl Into<Bytes>) -> Self {
        self.simulate_by_data.insert(data.into(), output.into());
        self
    }

    pub fn with_trace_gas(mut self, gas_used: u64) -> Self {
        self.trace = Ok(TraceSummary {
            gas_used,
            failed: false,
            steps: Some(42),
        });
        self
    }

    pub fn with_trace(mut self, trace: Result<TraceSummary, NetworkError>) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_price(mut self, price: Result<u128, NetworkError>) -> Self {
        self.price = price;
        self
    }

    pub fn with_code(mut self, address: Address, code: impl Into<Bytes>) -> Self {
        self.code.insert(address, code.into());
        self
    }

    pub fn with_receipt(mut self, receipt: TransactionOutcome) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn estimate_calls(&self) -> usize {
        self.calls.estimate.load(Ordering::SeqCst)
    }

    pub fn trace_calls(&self) -> usize {
        self.calls.trace.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.calls.submit.load(Ordering::SeqCst)
    }

    /// Calls that evaluate or analyze the measured function
    pub fn measurement_calls(&self) -> usize {
        [
            &self.calls.estimate,
            &self.calls.simulate,
            &self.calls.trace,
            &self.calls.code,
            &self.calls.storage,
            &self.calls.submit,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }
}

#[async_trait]
impl NetworkHandle for MockNetwork {
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, NetworkError> {
        self.calls.estimate.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.estimate_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(response) = call.from.and_then(|from| self.estimate_by_sender.get(&from)) {
            return response.clone();
        }
        self.estimate.clone()
    }

    async fn simulate_read_only(&self, call: &CallRequest) -> Result<Bytes, NetworkError> {
        self.calls.simulate.fetch_add(1, Ordering::SeqCst);
        if let Some(output) = self.simulate_by_data.get(&call.data) {
            return Ok(output.clone());
        }
        self.simulate.clone()
    }

    async fn trace_call(&self, call: &CallRequest) -> Result<TraceSummary, NetworkError> {
        self.calls.trace.fetch_add(1, Ordering::SeqCst);
        self.traced.lock().push(call.data.clone());
        self.trace.clone()
    }

    async fn fetch_unit_price(&self) -> Result<u128, NetworkError> {
        self.calls.price.fetch_add(1, Ordering::SeqCst);
        self.price.clone()
    }

    async fn get_deployed_code(&self, address: Address) -> Result<Bytes, NetworkError> {
        self.calls.code.fetch_add(1, Ordering::SeqCst);
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn get_storage_at(&self, _address: Address, _slot: U256) -> Result<U256, NetworkError> {
        self.calls.storage.fetch_add(1, Ordering::SeqCst);
        Ok(U256::ZERO)
    }

    async fn submit_transaction(&self, _call: &CallRequest) -> Result<TransactionOutcome, NetworkError> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        self.receipt.clone().ok_or_else(|| unsupported("eth_sendTransaction"))
    }

    async fn chain_id(&self) -> Result<u64, NetworkError> {
        self.chain_id.ok_or_else(|| unsupported("eth_chainId"))
    }
}
