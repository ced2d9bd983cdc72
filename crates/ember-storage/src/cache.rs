//! Ephemeral Cache
//!
//! TTL-keyed storage for volatile, non-secret, re-derivable data. Expiry is
//! lazy and authoritative: `get` never returns a stale entry, whether or not
//! a sweep has run. `sweep_expired` is an optimization, idempotent, and safe
//! to race with `set`/`get` because every removal decision compares the
//! entry's own `last_updated` under the write lock.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Expiry class of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheClass {
    /// Token balances (~30 s)
    Balance,
    /// Asset prices (~60 s)
    Price,
    /// Gas estimates (~15 s)
    GasEstimate,
    /// NFT metadata (~5 min)
    NftMetadata,
    /// DApp metadata (~24 h)
    DappMetadata,
    /// Swap quotes (~30 s, plus an explicit deadline)
    SwapQuote,
    /// Search / recent-address history (~24 h)
    RecentAddress,
}

impl CacheClass {
    /// Default TTL for this class
    pub fn default_ttl(&self) -> Duration {
        match self {
            CacheClass::Balance => Duration::from_secs(30),
            CacheClass::Price => Duration::from_secs(60),
            CacheClass::GasEstimate => Duration::from_secs(15),
            CacheClass::NftMetadata => Duration::from_secs(5 * 60),
            CacheClass::DappMetadata => Duration::from_secs(24 * 60 * 60),
            CacheClass::SwapQuote => Duration::from_secs(30),
            CacheClass::RecentAddress => Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Eviction priority. Lower priorities are evicted first when the cache
/// exceeds its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CachePriority {
    /// Evict first
    Low,
    /// Default
    Normal,
    /// Evict last
    High,
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entry count before eviction
    pub max_entries: usize,
    /// Per-class TTL overrides (tests, tuning)
    pub ttl_overrides: HashMap<CacheClass, Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 4096,
            ttl_overrides: HashMap::new(),
        }
    }
}

impl CacheConfig {
    fn ttl_for(&self, class: CacheClass) -> Duration {
        self.ttl_overrides
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.default_ttl())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    class: CacheClass,
    priority: CachePriority,
    /// Unix millis of the write that produced this entry
    last_updated: i64,
    /// Absolute deadline (unix millis); the earlier of TTL and deadline wins
    deadline: Option<i64>,
}

impl Entry {
    fn is_expired(&self, now_ms: i64, config: &CacheConfig) -> bool {
        let ttl_ms = config.ttl_for(self.class).as_millis() as i64;
        if now_ms - self.last_updated > ttl_ms {
            return true;
        }
        matches!(self.deadline, Some(deadline) if now_ms >= deadline)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// TTL-keyed ephemeral cache
pub struct EphemeralCache {
    entries: RwLock<HashMap<String, Entry>>,
    config: CacheConfig,
}

impl Default for EphemeralCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl EphemeralCache {
    /// Create a cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Insert or replace an entry
    pub fn set(&self, key: &str, value: Value, class: CacheClass, priority: CachePriority) {
        self.insert(key, value, class, priority, None);
    }

    /// Insert an entry with an explicit absolute deadline (unix millis).
    ///
    /// Swap quotes carry a `valid_until` from the quoting process; the entry
    /// expires at the earlier of the class TTL and the deadline.
    pub fn set_with_deadline(
        &self,
        key: &str,
        value: Value,
        class: CacheClass,
        priority: CachePriority,
        valid_until_ms: i64,
    ) {
        self.insert(key, value, class, priority, Some(valid_until_ms));
    }

    fn insert(
        &self,
        key: &str,
        value: Value,
        class: CacheClass,
        priority: CachePriority,
        deadline: Option<i64>,
    ) {
        let now = now_ms();
        let mut entries = self.entries.write();
        entries.insert(
            key.to_string(),
            Entry {
                value,
                class,
                priority,
                last_updated: now,
                deadline,
            },
        );

        if entries.len() > self.config.max_entries {
            Self::evict(&mut entries, now, &self.config);
        }
    }

    /// Read an entry. Absent once expired, even if still physically present.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = now_ms();
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.is_expired(now, &self.config) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Remove a single entry
    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.write().retain(|key, _| !key.starts_with(prefix));
    }

    /// Drop expired entries. Idempotent; safe to race with `get`/`set`.
    ///
    /// Each entry's own `last_updated` is compared under the write lock, so
    /// a sweep can never delete an entry that a concurrent `set` refreshed.
    pub fn sweep_expired(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, &self.config));
        before - entries.len()
    }

    /// Drop everything. Invoked on lock and on security-sensitive resets;
    /// never touches the descriptor or secret tiers.
    pub fn clear_all(&self) {
        self.entries.write().clear();
        tracing::debug!("ephemeral cache cleared");
    }

    /// Number of physically present entries (expired entries included until
    /// swept)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no entries are physically present
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn evict(entries: &mut HashMap<String, Entry>, now: i64, config: &CacheConfig) {
        // Expired entries first
        entries.retain(|_, entry| !entry.is_expired(now, config));

        // Then lowest priority, oldest first, down to capacity
        while entries.len() > config.max_entries {
            let victim = entries
                .iter()
                .min_by_key(|(_, e)| (e.priority, e.last_updated))
                .map(|(k, _)| k.clone());
            match victim {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
