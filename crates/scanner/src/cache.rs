//! TTL cache for scan results with stale-on-error fallback.
//!
//! Freshness is checked at lookup time; there is no background sweep.
//! Expired entries stay in the map so a failed rescan can still serve them
//! through [`ScanCache::get_stale`]. When the cache is full, inserting a new
//! key evicts the oldest entry.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::types::ContractInfo;

/// Default time-to-live for a cached scan (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached scans.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Cache key: `(address, protocol)`.
pub type CacheKey = (String, String);

#[derive(Debug, Clone)]
struct CacheEntry {
    info: ContractInfo,
    inserted_at: Instant,
}

/// Bounded `(address, protocol) -> ContractInfo` cache.
#[derive(Debug)]
pub struct ScanCache {
    ttl: Duration,
    capacity: usize,
    entries: RwLock<FxHashMap<CacheKey, CacheEntry>>,
}

impl ScanCache {
    /// A capacity of 0 is raised to 1.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry for `key` if it is younger than the TTL.
    pub fn get_fresh(&self, address: &str, protocol: &str) -> Option<ContractInfo> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&key(address, protocol))
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.info.clone())
    }

    /// Entry for `key` regardless of age.
    pub fn get_stale(&self, address: &str, protocol: &str) -> Option<ContractInfo> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&key(address, protocol))
            .map(|entry| entry.info.clone())
    }

    pub fn insert(&self, address: &str, protocol: &str, info: ContractInfo) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let key = key(address, protocol);

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(
                    address = %oldest.0,
                    protocol = %oldest.1,
                    "Evicting oldest cached scan"
                );
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                info,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

// Addresses are compared case-insensitively; checksummed and lowercase
// forms share an entry.
fn key(address: &str, protocol: &str) -> CacheKey {
    (address.to_ascii_lowercase(), protocol.to_string())
}
