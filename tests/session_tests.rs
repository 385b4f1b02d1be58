//! Integration tests for profiling sessions
//!
//! # Test Coverage
//! - Multi-run statistics
//! - Cost presence and absence
//! - Fee-paying sessions with receipts
//! - Session abort on failure
//! - JSON export

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address, B256, U256};
use common::{reverted, MockNetwork};
use evm_gas_profile::{
    types::{EfficiencyRating, TransactionOutcome},
    FunctionCall, Mode, ProfileError, Profiler, ProfilerConfig,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

fn gasless_config() -> ProfilerConfig {
    ProfilerConfig::default().with_inter_run_delay(Duration::ZERO)
}

fn receipt(success: bool) -> TransactionOutcome {
    TransactionOutcome {
        tx_hash: B256::repeat_byte(0xab),
        block_number: Some(19_000_000),
        gas_used: 48_000,
        effective_gas_price: 3_000_000_000,
        success,
    }
}

#[tokio::test]
async fn test_three_runs_of_view_function() {
    let network = Arc::new(MockNetwork::new().with_estimate(Ok(2_334)));
    let profiler = Profiler::new(network.clone(), gasless_config()).unwrap();
    let calls = [FunctionCall::parse("function get() view returns (uint256)").unwrap()];

    let session = profiler.profile(CONTRACT, &calls).await.unwrap();
    let profile = session.function("get()").unwrap();

    assert_eq!(profile.runs.len(), 3);
    assert_eq!(profile.stats.total, 7_002);
    assert_eq!(profile.stats.avg, 2_334);
    assert_eq!(profile.stats.min, 2_334);
    assert_eq!(profile.stats.max, 2_334);
    assert_eq!(profile.stats.call_count, 3);
    assert_eq!(profile.stats.efficiency, EfficiencyRating::Excellent);
    assert_eq!(profile.stats.fallback_runs, 0);
    assert!(profile.runs.iter().all(|run| run.measurement.mode == Mode::StaticCall));
    let indices: Vec<usize> = profile.runs.iter().map(|run| run.run_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    // runs after the first are served from the cache
    assert_eq!(network.estimate_calls(), 1);
    assert_eq!(session.cache.unwrap().hits, 2);
}

#[tokio::test]
async fn test_costs_present_with_price() {
    let network = Arc::new(
        MockNetwork::new()
            .with_estimate(Ok(2_334))
            .with_price(Ok(2_000_000_000)),
    );
    let profiler = Profiler::new(network.clone(), gasless_config()).unwrap();
    let calls = [FunctionCall::parse("function get() view returns (uint256)").unwrap()];

    let session = profiler.profile(CONTRACT, &calls).await.unwrap();
    let profile = session.function("get()").unwrap();
    let cost = profile.stats.cost.as_ref().unwrap();

    assert_eq!(cost.min_cost, U256::from(4_668_000_000_000u64));
    assert_eq!(cost.total_cost, U256::from(14_004_000_000_000u64));
    assert!(profile.runs.iter().all(|run| run.unit_price == Some(2_000_000_000)));
    assert_eq!(session.display_cost(cost.avg_cost), "0.000004668 ETH");
}

#[tokio::test]
async fn test_costs_absent_without_price() {
    let network = Arc::new(MockNetwork::new().with_estimate(Ok(2_334)));
    let profiler = Profiler::new(network.clone(), gasless_config()).unwrap();
    let calls = [FunctionCall::parse("function get() view returns (uint256)").unwrap()];

    let session = profiler.profile(CONTRACT, &calls).await.unwrap();
    let profile = session.function("get()").unwrap();
    assert!(profile.stats.cost.is_none());
    assert!(profile.runs.iter().all(|run| run.cost.is_none()));

    let exported = session.to_json_pretty().unwrap();
    assert!(exported.contains("\"get()\""));
    assert!(!exported.contains("total_cost"));
}

#[tokio::test]
async fn test_fee_paying_session_uses_receipts() {
    let network = Arc::new(
        MockNetwork::new()
            .with_estimate(Ok(50_000))
            .with_receipt(receipt(true)),
    );
    let config = gasless_config().with_gasless(false).with_runs(2);
    let profiler = Profiler::new(network.clone(), config).unwrap();
    let calls = [FunctionCall::parse("function set(uint256 value)")
        .unwrap()
        .with_args(vec![json!(5)])];

    let session = profiler.profile(CONTRACT, &calls).await.unwrap();
    let profile = session.function("set(uint256)").unwrap();

    assert!(!session.gasless);
    assert!(session.cache.is_none());
    assert_eq!(network.submit_calls(), 2);
    assert_eq!(profile.stats.total, 96_000);
    for run in &profile.runs {
        assert_eq!(run.measurement.mode, Mode::Direct);
        assert_eq!(run.measurement.confidence, 100);
        assert_eq!(run.tx_hash, Some(B256::repeat_byte(0xab)));
        assert_eq!(run.block_number, Some(19_000_000));
        assert_eq!(run.cost, Some(U256::from(144_000_000_000_000u64)));
    }
}

#[tokio::test]
async fn test_fee_paying_failure_aborts_session() {
    let network = Arc::new(MockNetwork::new().with_estimate(Err(reverted("paused"))));
    let config = gasless_config().with_gasless(false);
    let profiler = assert_ok!(Profiler::new(network.clone(), config));
    let calls = [
        FunctionCall::parse("function pause()").unwrap(),
        FunctionCall::parse("function unpause()").unwrap(),
    ];

    let err = assert_err!(profiler.profile(CONTRACT, &calls).await);
    assert!(matches!(err, ProfileError::AllStrategiesExhausted { .. }));
    assert_eq!(network.estimate_calls(), 1);
    assert_eq!(network.trace_calls(), 0);
}

#[tokio::test]
async fn test_reverted_transaction_aborts_session() {
    let network = Arc::new(
        MockNetwork::new()
            .with_estimate(Ok(50_000))
            .with_receipt(receipt(false)),
    );
    let config = gasless_config().with_gasless(false);
    let profiler = Profiler::new(network.clone(), config).unwrap();
    let calls = [FunctionCall::parse("function pause()").unwrap()];

    let err = profiler.profile(CONTRACT, &calls).await.unwrap_err();
    assert!(matches!(err, ProfileError::TransactionFailed { .. }));
    assert_eq!(network.submit_calls(), 1);
}

#[tokio::test]
async fn test_gasless_session_never_fails_on_strategy_errors() {
    let network = Arc::new(
        MockNetwork::new()
            .with_estimate(Err(reverted("paused")))
            .with_simulate(Err(reverted("paused"))),
    );
    let profiler = Profiler::new(network.clone(), gasless_config().with_runs(2)).unwrap();
    let calls = [FunctionCall::parse("function mint(address to, uint256 amount)").unwrap()];

    let session = profiler.profile(CONTRACT, &calls).await.unwrap();
    let profile = session.function("mint(address,uint256)").unwrap();
    assert_eq!(profile.stats.avg, 70_000);
    assert_eq!(profile.stats.fallback_runs, 2);
    assert!(profile.stats.average_confidence <= 10);
    assert!(profile.runs.iter().all(|run| !run.measurement.success));
}

#[tokio::test(start_paused = true)]
async fn test_runs_are_paced() {
    let network = Arc::new(MockNetwork::new().with_estimate(Ok(2_334)));
    let config = ProfilerConfig::default().with_inter_run_delay(Duration::from_millis(250));
    let profiler = Profiler::new(network.clone(), config).unwrap();
    let calls = [FunctionCall::parse("function get() view returns (uint256)").unwrap()];

    let start = tokio::time::Instant::now();
    profiler.profile(CONTRACT, &calls).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[test]
fn test_invalid_config_is_rejected() {
    let network = Arc::new(MockNetwork::new());
    let config = ProfilerConfig::default().with_gasless(false).with_mode(Mode::Trace);
    assert!(matches!(
        Profiler::new(network, config),
        Err(ProfileError::Config(_))
    ));
}
