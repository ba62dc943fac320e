use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::config::GatewayConfig;

/// Query parameters attached to a GET call. Sorted so that the same set of
/// parameters always produces the same cache key.
pub type QueryParams = BTreeMap<String, String>;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub timestamp: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) < ttl
    }
}

/// Builds the cache key for `path` and `params`: the path, a `?`, then the
/// params serialized as JSON (`/api/stats?{}`).
pub fn cache_key(path: &str, params: &QueryParams) -> String {
    let serialized = serde_json::to_string(params).unwrap_or_default();
    format!("{}?{}", path, serialized)
}

/// In-memory response store with a fixed time-to-live.
///
/// Expired entries are not swept in the background; they are dropped the next
/// time a lookup touches them.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave a half-written entry behind,
    // so a poisoned map is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the payload stored under `key` if it is still within the TTL,
    /// evicting it otherwise.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let mut entries = self.entries();
        let entry = entries.get(key)?;
        if entry.is_fresh(now, self.ttl) {
            debug!("Cache hit for {}", key);
            return Some(entry.data.clone());
        }

        debug!("Evicting expired cache entry for {}", key);
        entries.remove(key);
        None
    }

    /// Stores `data` under `key`, replacing whatever was there.
    pub fn insert(&self, key: impl Into<String>, data: Value) {
        self.insert_at(key.into(), data, Instant::now());
    }

    pub(crate) fn insert_at(&self, key: String, data: Value, timestamp: Instant) {
        let entry = CacheEntry {
            key: key.clone(),
            data,
            timestamp,
        };
        self.entries().insert(key, entry);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }
}

lazy_static::lazy_static! {
    /// Process-wide cache used by gateways that are not given their own. Its
    /// TTL is read once from the environment (`CONFERENCE_CACHE_TTL_SECS`).
    pub static ref SHARED_CACHE: Arc<ResponseCache> =
        Arc::new(ResponseCache::new(GatewayConfig::from_env().cache_ttl));
}
