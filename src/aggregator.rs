//! Run statistics
//!
//! Runs are immutable [`RunRecord`]s. Statistics are recomputed from the full
//! record list by the pure [`aggregate`] fold, so a snapshot never depends on
//! the order in which it was requested.

use std::collections::BTreeMap;

use alloy::primitives::U256;

use crate::types::{AggregatedStats, CostSummary, EfficiencyRating, RunRecord};

/// Spread thresholds in basis points of the average
const EXCELLENT_SPREAD_BPS: u128 = 500;
const GOOD_SPREAD_BPS: u128 = 1_500;
const FAIR_SPREAD_BPS: u128 = 3_000;

/// Classifies the spread `(max - min) / avg`
pub fn efficiency(min: u64, max: u64, avg: u64) -> EfficiencyRating {
    if avg == 0 {
        return EfficiencyRating::Excellent;
    }
    let spread_bps = (max.saturating_sub(min) as u128) * 10_000 / avg as u128;
    if spread_bps < EXCELLENT_SPREAD_BPS {
        EfficiencyRating::Excellent
    } else if spread_bps < GOOD_SPREAD_BPS {
        EfficiencyRating::Good
    } else if spread_bps < FAIR_SPREAD_BPS {
        EfficiencyRating::Fair
    } else {
        EfficiencyRating::Variable
    }
}

/// Integer mean rounded half up
fn rounded_mean(total: u128, count: u128) -> u128 {
    (total + count / 2) / count
}

/// Statistics over `records`, `None` when empty
///
/// Cost fields are present only when at least one run carries a cost, and
/// are computed over those runs.
pub fn aggregate(records: &[RunRecord]) -> Option<AggregatedStats> {
    if records.is_empty() {
        return None;
    }

    let gas: Vec<u64> = records.iter().map(RunRecord::gas_used).collect();
    let min = gas.iter().copied().min().unwrap_or_default();
    let max = gas.iter().copied().max().unwrap_or_default();
    let total: u128 = gas.iter().map(|g| *g as u128).sum();
    let count = records.len() as u128;
    let avg = rounded_mean(total, count) as u64;

    let confidence_total: u128 = records.iter().map(|r| r.measurement.confidence as u128).sum();

    Some(AggregatedStats {
        min,
        max,
        avg,
        total,
        call_count: records.len(),
        efficiency: efficiency(min, max, avg),
        average_confidence: rounded_mean(confidence_total, count) as u8,
        fallback_runs: records.iter().filter(|r| r.measurement.used_fallback).count(),
        cost: cost_summary(records),
    })
}

fn cost_summary(records: &[RunRecord]) -> Option<CostSummary> {
    let costs: Vec<U256> = records.iter().filter_map(|r| r.cost).collect();
    let min_cost = costs.iter().copied().min()?;
    let max_cost = costs.iter().copied().max()?;
    let total_cost = costs.iter().fold(U256::ZERO, |acc, c| acc.saturating_add(*c));
    let n = U256::from(costs.len());
    let avg_cost = (total_cost + n / U256::from(2u64)) / n;
    Some(CostSummary {
        min_cost,
        max_cost,
        avg_cost,
        total_cost,
    })
}

/// Run records grouped by function signature
#[derive(Debug, Clone, Default)]
pub struct RunAggregator {
    runs: BTreeMap<String, Vec<RunRecord>>,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, signature: &str, record: RunRecord) {
        self.runs.entry(signature.to_string()).or_default().push(record);
    }

    /// Recomputed statistics for `signature`
    pub fn snapshot(&self, signature: &str) -> Option<AggregatedStats> {
        self.runs.get(signature).and_then(|records| aggregate(records))
    }

    pub fn runs(&self, signature: &str) -> &[RunRecord] {
        self.runs.get(signature).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.runs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MeasurementResult, Mode};

    fn run(index: usize, gas: u64, cost: Option<u64>) -> RunRecord {
        RunRecord {
            run_index: index,
            measurement: MeasurementResult::measured(Mode::Estimate, gas),
            started_at_ms: 0,
            duration_ms: 0,
            tx_hash: None,
            block_number: None,
            unit_price: None,
            cost: cost.map(U256::from),
        }
    }

    #[test]
    fn test_average_rounds_half_up() {
        let stats = aggregate(&[run(0, 100, None), run(1, 101, None)]).unwrap();
        assert_eq!(stats.avg, 101);
        let stats = aggregate(&[run(0, 100, None), run(1, 100, None), run(2, 101, None)]).unwrap();
        assert_eq!(stats.avg, 100);
        assert_eq!(stats.total, 301);
    }

    #[test]
    fn test_total_is_exact_past_u64() {
        let stats = aggregate(&[run(0, u64::MAX, None), run(1, u64::MAX, None), run(2, 1, None)]).unwrap();
        assert_eq!(stats.total, 2 * u64::MAX as u128 + 1);
        assert_eq!(stats.avg as u128, (stats.total + 1) / 3);
    }

    #[test]
    fn test_efficiency_thresholds() {
        assert_eq!(efficiency(100, 104, 100), EfficiencyRating::Excellent);
        assert_eq!(efficiency(100, 105, 100), EfficiencyRating::Good);
        assert_eq!(efficiency(100, 129, 100), EfficiencyRating::Fair);
        assert_eq!(efficiency(100, 130, 100), EfficiencyRating::Variable);
        assert_eq!(efficiency(0, 0, 0), EfficiencyRating::Excellent);
    }

    #[test]
    fn test_cost_only_from_priced_runs() {
        assert!(aggregate(&[run(0, 10, None)]).unwrap().cost.is_none());

        let stats = aggregate(&[run(0, 10, Some(30)), run(1, 20, None), run(2, 30, Some(91))]).unwrap();
        let cost = stats.cost.unwrap();
        assert_eq!(cost.min_cost, U256::from(30u64));
        assert_eq!(cost.max_cost, U256::from(91u64));
        assert_eq!(cost.total_cost, U256::from(121u64));
        assert_eq!(cost.avg_cost, U256::from(61u64));
    }

    #[test]
    fn test_snapshot_is_recomputed() {
        let mut aggregator = RunAggregator::new();
        assert!(aggregator.snapshot("get()").is_none());
        aggregator.record("get()", run(0, 2_334, None));
        assert_eq!(aggregator.snapshot("get()").unwrap().call_count, 1);
        aggregator.record("get()", run(1, 2_334, None));
        let stats = aggregator.snapshot("get()").unwrap();
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.total, 4_668);
        assert_eq!(aggregator.runs("get()").len(), 2);
    }
}
