//! Memoization of simulated measurements
//!
//! [`ResultCache`] maps a [`CallFingerprint`] to the measurement obtained for
//! it. Entries live for a fixed TTL; a stale entry counts as a miss and is
//! removed on access. When an insert pushes the entry count above the
//! capacity, stale entries are swept first, then the oldest insertions.
//!
//! The cache is an explicit value shared through `Arc`, so independent
//! profilers never see each other's entries unless they are handed the same
//! instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, B256};
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::types::{MeasurementResult, Mode};

/// Domain separator mixed into every fingerprint
static FINGERPRINT_DOMAIN: Lazy<B256> = Lazy::new(|| keccak256(b"evm-gas-profile/fingerprint/v1"));

/// Identity of a measurement
///
/// Hash of contract, selector, canonical argument encoding, mode, sponsor
/// and sender. Every component is length-prefixed, so no two distinct
/// component lists hash the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CallFingerprint(pub B256);

impl CallFingerprint {
    /// `calldata` is the full ABI encoding, selector included
    pub fn new(
        contract: Address,
        calldata: &[u8],
        mode: Mode,
        sponsor: Option<Address>,
        sender: Option<Address>,
    ) -> Self {
        let (selector, args) = calldata.split_at(calldata.len().min(4));
        Self::hash(contract, selector, Some(args), mode, sponsor, sender)
    }

    /// Call whose arguments are left to the argument advisor
    ///
    /// Never equal to a fingerprint built from explicit arguments, including
    /// an empty argument list.
    pub fn advised(
        contract: Address,
        selector: &[u8],
        mode: Mode,
        sponsor: Option<Address>,
        sender: Option<Address>,
    ) -> Self {
        Self::hash(contract, selector, None, mode, sponsor, sender)
    }

    fn hash(
        contract: Address,
        selector: &[u8],
        args: Option<&[u8]>,
        mode: Mode,
        sponsor: Option<Address>,
        sender: Option<Address>,
    ) -> Self {
        let mut buf = Vec::with_capacity(args.map_or(0, <[u8]>::len) + 170);
        let mut push = |part: &[u8]| {
            buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
            buf.extend_from_slice(part);
        };
        push(FINGERPRINT_DOMAIN.as_slice());
        push(contract.as_slice());
        push(selector);
        match args {
            Some(args) => {
                push(b"explicit");
                push(args);
            }
            None => push(b"advised"),
        }
        push(mode.tag().as_bytes());
        push(sponsor.as_ref().map(|a| a.as_slice()).unwrap_or_default());
        push(sender.as_ref().map(|a| a.as_slice()).unwrap_or_default());
        Self(keccak256(&buf))
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

struct Entry {
    result: MeasurementResult,
    inserted_at: Instant,
}

/// TTL and size bounded measurement cache
pub struct ResultCache {
    entries: Mutex<HashMap<CallFingerprint, Entry>>,
    ttl: Duration,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}

impl ResultCache {
    /// A capacity of zero is treated as one
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fresh entry for `fingerprint`; a stale entry is evicted and reported as a miss
    pub fn get(&self, fingerprint: &CallFingerprint) -> Option<MeasurementResult> {
        let mut entries = self.entries.lock();
        let fresh = match entries.get(fingerprint) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(fingerprint);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("cache entry {} expired", fingerprint.0);
                None
            }
            None => None,
        };

        match fresh {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `result`, replacing any previous entry for `fingerprint`
    pub fn put(&self, fingerprint: CallFingerprint, result: MeasurementResult) {
        let mut entries = self.entries.lock();
        entries.insert(
            fingerprint,
            Entry {
                result,
                inserted_at: Instant::now(),
            },
        );

        if entries.len() <= self.capacity {
            return;
        }

        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        if entries.len() > self.capacity {
            let mut by_age: Vec<(Instant, CallFingerprint)> =
                entries.iter().map(|(key, entry)| (entry.inserted_at, *key)).collect();
            by_age.sort();
            let excess = entries.len() - self.capacity;
            for (_, key) in by_age.into_iter().take(excess) {
                entries.remove(&key);
            }
        }

        let evicted = (before - entries.len()) as u64;
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
        debug!("cache sweep evicted {} entries", evicted);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
