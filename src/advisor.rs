//! Built-in argument advisors
//!
//! - [`DefaultArgumentAdvisor`] synthesises a plausible value for every input
//!   from its ABI type
//! - [`StaticArgumentAdvisor`] returns fixed advice per function signature,
//!   useful when the caller knows working arguments

use std::collections::HashMap;

use alloy::json_abi::Function;
use alloy::primitives::{address, Address};
use async_trait::async_trait;

use crate::traits::{ArgumentAdvice, ArgumentAdvisor};
use crate::utils::abi_utils::default_args;

/// First account of local development nodes
pub const DEFAULT_SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Confidence of type-derived arguments
pub const DEFAULT_ADVICE_CONFIDENCE: u8 = 40;

/// Type-driven argument synthesis
#[derive(Debug, Clone)]
pub struct DefaultArgumentAdvisor {
    sender: Address,
}

impl DefaultArgumentAdvisor {
    pub fn new(sender: Address) -> Self {
        Self { sender }
    }
}

impl Default for DefaultArgumentAdvisor {
    fn default() -> Self {
        Self::new(DEFAULT_SENDER)
    }
}

#[async_trait]
impl ArgumentAdvisor for DefaultArgumentAdvisor {
    async fn advise(&self, function: &Function) -> Option<ArgumentAdvice> {
        Some(ArgumentAdvice {
            args: default_args(function, self.sender),
            sender: Some(self.sender),
            confidence: DEFAULT_ADVICE_CONFIDENCE,
        })
    }
}

/// Fixed advice keyed by canonical signature (`"transfer(address,uint256)"`)
#[derive(Debug, Clone, Default)]
pub struct StaticArgumentAdvisor {
    advice: HashMap<String, ArgumentAdvice>,
}

impl StaticArgumentAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advice(mut self, signature: impl Into<String>, advice: ArgumentAdvice) -> Self {
        self.advice.insert(signature.into(), advice);
        self
    }
}

#[async_trait]
impl ArgumentAdvisor for StaticArgumentAdvisor {
    async fn advise(&self, function: &Function) -> Option<ArgumentAdvice> {
        self.advice.get(&function.signature()).cloned()
    }
}
