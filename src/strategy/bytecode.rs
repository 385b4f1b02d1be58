//! Static gas estimation from deployed bytecode
//!
//! When no execution-based strategy works, the deployed code still says a
//! lot: how many storage writes, external calls and logs the contract can
//! perform, and whether it contains loops. The figure is coarse and always
//! reported with low confidence.

use std::collections::HashSet;

use alloy::primitives::Bytes;
use async_trait::async_trait;
use log::debug;
use revm::bytecode::opcode;

use super::ExecutionContext;
use crate::errors::StrategyError;
use crate::traits::StrategyExecutor;
use crate::types::{MeasurementResult, Mode};
use crate::utils::proxy_utils::get_implementation;

/// Intrinsic cost of any transaction
pub const TX_BASE_GAS: u64 = 21_000;

/// Confidence of a heuristic figure for loop-free code
pub const HEURISTIC_CONFIDENCE: u8 = 30;

/// Confidence when backward jumps were found
pub const LOOPING_CONFIDENCE: u8 = 20;

/// Gas assumed for every detected loop
const LOOP_GAS: u64 = 5_000;

/// Loops counted at most
const MAX_LOOPS: u64 = 8;

/// Opcode statistics of a contract's runtime code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytecodeProfile {
    /// Weighted gas of every instruction, executed once
    pub weighted_gas: u64,
    /// Distinct 4-byte constants pushed, a proxy for dispatched selectors
    pub selector_count: usize,
    /// Backward jumps to a constant destination
    pub loop_count: u64,
    pub storage_writes: usize,
    pub external_calls: usize,
}

impl BytecodeProfile {
    /// Estimated gas of one call carrying `calldata`
    pub fn estimate(&self, calldata: &[u8]) -> u64 {
        let share = self.weighted_gas / self.selector_count.max(1) as u64;
        TX_BASE_GAS
            .saturating_add(calldata_gas(calldata))
            .saturating_add(share)
            .saturating_add(self.loop_count.min(MAX_LOOPS) * LOOP_GAS)
    }

    pub fn confidence(&self) -> u8 {
        if self.loop_count > 0 {
            LOOPING_CONFIDENCE
        } else {
            HEURISTIC_CONFIDENCE
        }
    }
}

/// Calldata cost: 4 gas per zero byte, 16 per non-zero byte
pub fn calldata_gas(calldata: &[u8]) -> u64 {
    calldata
        .iter()
        .map(|byte| if *byte == 0 { 4 } else { 16 })
        .sum()
}

/// Static gas weight of one opcode
fn opcode_weight(op: u8) -> u64 {
    match op {
        opcode::SSTORE => 20_000,
        opcode::SLOAD => 2_100,
        opcode::CALL | opcode::CALLCODE | opcode::DELEGATECALL | opcode::STATICCALL => 2_600,
        opcode::BALANCE | opcode::EXTCODESIZE | opcode::EXTCODECOPY | opcode::EXTCODEHASH => 2_600,
        opcode::CREATE | opcode::CREATE2 => 32_000,
        opcode::SELFDESTRUCT => 5_000,
        opcode::LOG0 => 375,
        opcode::LOG1 => 750,
        opcode::LOG2 => 1_125,
        opcode::LOG3 => 1_500,
        opcode::LOG4 => 1_875,
        opcode::KECCAK256 => 36,
        opcode::EXP => 60,
        opcode::JUMPDEST => 1,
        opcode::STOP | opcode::RETURN | opcode::REVERT | opcode::INVALID => 0,
        _ => 3,
    }
}

/// Number of immediate bytes following `op`
fn immediate_len(op: u8) -> usize {
    if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
        (op - opcode::PUSH1 + 1) as usize
    } else {
        0
    }
}

/// Walks the instructions of `code`, yielding `(pc, opcode, immediate)`
fn instructions(code: &[u8]) -> impl Iterator<Item = (usize, u8, &[u8])> {
    let mut pc = 0;
    std::iter::from_fn(move || {
        if pc >= code.len() {
            return None;
        }
        let op = code[pc];
        let start = pc + 1;
        let end = (start + immediate_len(op)).min(code.len());
        let item = (pc, op, &code[start..end]);
        pc = end.max(start);
        Some(item)
    })
}

/// Every 4-byte constant pushed by `code`
pub fn push4_selectors(code: &[u8]) -> HashSet<[u8; 4]> {
    instructions(code)
        .filter(|(_, op, imm)| *op == opcode::PUSH4 && imm.len() == 4)
        .filter_map(|(_, _, imm)| <[u8; 4]>::try_from(imm).ok())
        .collect()
}

/// Scans runtime code into a [`BytecodeProfile`]
pub fn analyze(code: &[u8]) -> BytecodeProfile {
    let mut profile = BytecodeProfile {
        selector_count: push4_selectors(code).len(),
        ..Default::default()
    };

    let mut last_push: Option<(usize, u64)> = None;
    for (pc, op, imm) in instructions(code) {
        profile.weighted_gas = profile.weighted_gas.saturating_add(opcode_weight(op));
        match op {
            opcode::SSTORE => profile.storage_writes += 1,
            opcode::CALL | opcode::CALLCODE | opcode::DELEGATECALL | opcode::STATICCALL => {
                profile.external_calls += 1
            }
            opcode::JUMP | opcode::JUMPI => {
                if let Some((push_pc, dest)) = last_push {
                    if push_pc + 3 >= pc && (dest as usize) < pc {
                        profile.loop_count += 1;
                    }
                }
            }
            _ => {}
        }
        last_push = match op {
            opcode::PUSH1 | opcode::PUSH2 => Some((
                pc,
                imm.iter().fold(0u64, |acc, byte| (acc << 8) | *byte as u64),
            )),
            _ => None,
        };
    }
    profile
}

/// Static analysis of deployed bytecode
#[derive(Debug, Clone, Copy, Default)]
pub struct BytecodeHeuristicExecutor;

#[async_trait]
impl StrategyExecutor for BytecodeHeuristicExecutor {
    fn mode(&self) -> Mode {
        Mode::BytecodeHeuristic
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<MeasurementResult, StrategyError> {
        let target = ctx.request.to;
        let mut code: Bytes = ctx.network.get_deployed_code(target).await?;
        if code.is_empty() {
            return Err(StrategyError::Execution(format!("no code deployed at {}", target)));
        }

        if let Some(implementation) = get_implementation(ctx.network, target).await? {
            let logic = ctx.network.get_deployed_code(implementation).await?;
            if !logic.is_empty() {
                code = logic;
            }
        }

        let profile = analyze(&code);
        let gas = profile.estimate(&ctx.request.data);
        debug!(
            "{} bytecode heuristic: {} gas ({} selectors, {} loops, {} sstores, {} calls)",
            ctx.function.name,
            gas,
            profile.selector_count,
            profile.loop_count,
            profile.storage_writes,
            profile.external_calls
        );

        Ok(MeasurementResult::measured(Mode::BytecodeHeuristic, gas).with_confidence(profile.confidence()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_data_is_not_decoded_as_opcodes() {
        // PUSH2 0x5555 (SSTORE bytes as data), STOP
        let code = [opcode::PUSH2, opcode::SSTORE, opcode::SSTORE, opcode::STOP];
        let profile = analyze(&code);
        assert_eq!(profile.storage_writes, 0);
        assert_eq!(profile.weighted_gas, 3);
    }

    #[test]
    fn test_selectors_split_the_body() {
        // Two PUSH4 selectors then one SSTORE
        let code = [
            opcode::PUSH4, 0xa9, 0x05, 0x9c, 0xbb,
            opcode::PUSH4, 0x09, 0x5e, 0xa7, 0xb3,
            opcode::SSTORE,
        ];
        let profile = analyze(&code);
        assert_eq!(profile.selector_count, 2);
        assert!(push4_selectors(&code).contains(&[0xa9, 0x05, 0x9c, 0xbb]));
        assert_eq!(profile.estimate(&[]), TX_BASE_GAS + (3 + 3 + 20_000) / 2);
        assert_eq!(profile.confidence(), HEURISTIC_CONFIDENCE);
    }

    #[test]
    fn test_backward_jump_counts_as_loop() {
        // 0: JUMPDEST, 1: PUSH1 0x00, 3: JUMP
        let code = [opcode::JUMPDEST, opcode::PUSH1, 0x00, opcode::JUMP];
        let profile = analyze(&code);
        assert_eq!(profile.loop_count, 1);
        assert_eq!(profile.confidence(), LOOPING_CONFIDENCE);

        // forward jump is not a loop
        let code = [opcode::PUSH1, 0x04, opcode::JUMP, opcode::STOP, opcode::JUMPDEST];
        assert_eq!(analyze(&code).loop_count, 0);
    }

    #[test]
    fn test_truncated_push_at_end() {
        let code = [opcode::SLOAD, opcode::PUSH32, 0x01];
        let profile = analyze(&code);
        assert_eq!(profile.weighted_gas, 2_100 + 3);
    }

    #[test]
    fn test_calldata_gas() {
        assert_eq!(calldata_gas(&[0, 0, 1, 2]), 4 + 4 + 16 + 16);
    }
}
