//! Gas profiling example
//!
//! This example demonstrates how to:
//! - Connect to an RPC endpoint
//! - Profile read-only and state-changing functions of a deployed token
//! - Display per-function statistics and costs
//!
//! Usage:
//! ```text
//! RPC_URL=https://eth.llamarpc.com cargo run --example profile_contract [config.json]
//! ```
//!
//! The optional JSON file follows `ProfilerConfig`; every field may be omitted.
//! Set `RUST_LOG=debug` to follow every strategy attempt.

use std::sync::Arc;

use alloy::primitives::address;
use anyhow::Result;
use colored::*;
use evm_gas_profile::{network::AlloyNetwork, FunctionCall, Profiler, ProfilerConfig};
use prettytable::{format, Cell, Row, Table};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => ProfilerConfig::from_json_file(path)?,
        None => ProfilerConfig::default(),
    };
    if let Ok(rpc_url) = std::env::var("RPC_URL") {
        config = config.with_rpc_url(rpc_url);
    }
    let rpc_url = config
        .rpc_url
        .clone()
        .unwrap_or_else(|| "https://eth.llamarpc.com".to_string());

    let network = AlloyNetwork::connect(&rpc_url).await?;
    println!("{}", format!("✅ Connected to {}\n", rpc_url).green());

    // USDC on Ethereum mainnet
    let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    let holder = address!("37305B1cD40574E4C5Ce33f8e8306Be057fD7341");
    let calls = [
        FunctionCall::parse("function totalSupply() view returns (uint256)")?,
        FunctionCall::parse("function balanceOf(address account) view returns (uint256)")?
            .with_args(vec![json!(holder.to_string())]),
        FunctionCall::parse("function approve(address spender, uint256 amount)")?,
        FunctionCall::parse("function transfer(address to, uint256 amount)")?
            .with_args(vec![json!(holder.to_string()), json!("1000000")]),
    ];

    let profiler = Profiler::new(Arc::new(network), config)?;
    let session = profiler.profile(usdc, &calls).await?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.add_row(Row::new(vec![
        Cell::new("Function").style_spec("Fb"),
        Cell::new("Mode").style_spec("Fb"),
        Cell::new("Avg gas").style_spec("Fb"),
        Cell::new("Min / Max").style_spec("Fb"),
        Cell::new("Confidence").style_spec("Fb"),
        Cell::new("Efficiency").style_spec("Fb"),
        Cell::new("Avg cost").style_spec("Fb"),
    ]));

    for (signature, profile) in &session.functions {
        let stats = &profile.stats;
        let mode = profile
            .runs
            .last()
            .map(|run| run.measurement.mode.to_string())
            .unwrap_or_default();
        let cost = stats
            .cost
            .as_ref()
            .map(|cost| session.display_cost(cost.avg_cost))
            .unwrap_or_else(|| "n/a".to_string());

        table.add_row(Row::new(vec![
            Cell::new(signature),
            Cell::new(&mode),
            Cell::new(&stats.avg.to_string()),
            Cell::new(&format!("{} / {}", stats.min, stats.max)),
            Cell::new(&format!("{}%", stats.average_confidence)),
            Cell::new(&stats.efficiency.to_string()),
            Cell::new(&cost),
        ]));
    }

    println!("Profile of {} on chain {:?}:", usdc, session.chain_id);
    table.printstd();

    for (signature, profile) in &session.functions {
        if profile.runs.iter().any(|run| !run.measurement.success) {
            println!(
                "{}",
                format!("⚠️  {} has no measured figure, showing a name-based guess", signature).yellow()
            );
        } else if profile.stats.fallback_runs > 0 {
            println!("{}", format!("ℹ️  {} needed a fallback strategy", signature).blue());
        }
    }

    if let Some(cache) = session.cache {
        println!(
            "\nCache: {} hits, {} misses, {} evictions",
            cache.hits, cache.misses, cache.evictions
        );
    }

    println!("\n{}", "✅ Profiling complete".bold().green());
    Ok(())
}
