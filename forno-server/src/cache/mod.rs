//! In-memory TTL cache
//!
//! Keyed store for catalog and zone reads. An entry read at or after
//! `inserted_at + ttl` is a miss and is evicted on the spot; the background
//! sweep drops the remaining expired entries and trims the oldest ones once
//! the store grows past `max_entries`.
//!
//! Every invalidation bumps a generation counter. A read-through load that
//! was in flight while the generation moved returns its value but does not
//! store it, so a write can never be shadowed by a load that started before it.
//!
//! The lock is a `parking_lot::Mutex` and is never held across `.await`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use shared::error::AppError;
use tokio::time::Instant;

/// Catalog key patterns
pub mod keys {
    pub const MENU: &str = "menu";
    pub const CATEGORIES_ALL: &str = "categories:all";
    pub const PRODUCTS_ALL: &str = "products:all";
    pub const ZONES_ACTIVE: &str = "delivery_zones:active";
    pub const SETTINGS: &str = "settings";

    /// Everything derived from categories or products
    pub const CATALOG_PATTERN: &str = r"^(menu|categories:.*|products:.*)$";
    pub const ZONES_PATTERN: &str = r"^delivery_zones:.*$";

    pub fn product(id: i64) -> String {
        format!("products:{id}")
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    generation: u64,
}

/// Counters exposed on the admin cache endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

/// Result of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub trimmed: usize,
}

/// Listing row for the admin cache endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeyInfo {
    pub key: String,
    pub age_ms: u64,
    pub ttl_ms: u64,
}

#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
                generation: 0,
            })),
            default_ttl,
            max_entries,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Value for `key` if still fresh; an expired entry is evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            inner.entries.remove(key);
            inner.evictions += 1;
            inner.misses += 1;
            return None;
        }
        inner.hits += 1;
        inner.entries.get(key).map(|e| e.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };
        self.inner.lock().entries.insert(key.into(), entry);
    }

    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Cached value, or the result of `load` stored under the default TTL.
    ///
    /// Load errors are returned as-is and nothing is cached. The loaded value
    /// is not stored if any invalidation happened while it was loading.
    pub async fn get_or_load<E, F, Fut>(&self, key: &str, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        let generation = self.inner.lock().generation;
        let value = load().await?;

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.entries.insert(
                key.to_string(),
                CacheEntry {
                    value: value.clone(),
                    inserted_at: Instant::now(),
                    ttl: self.default_ttl,
                },
            );
        } else {
            tracing::debug!(key, "Cache invalidated during load, result not stored");
        }
        Ok(value)
    }

    /// Returns true if the key was present
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.entries.remove(key).is_some()
    }

    /// Remove every key matching `pattern`; returns how many were removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<usize, AppError> {
        let re = Regex::new(pattern).map_err(|e| {
            AppError::validation(format!("Invalid cache key pattern: {e}"))
                .with_detail("pattern", pattern)
        })?;
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !re.is_match(k));
        Ok(before - inner.entries.len())
    }

    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let n = inner.entries.len();
        inner.entries.clear();
        n
    }

    /// Drop expired entries, then the oldest ones beyond `max_entries`.
    pub fn sweep(&self) -> SweepReport {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.is_expired(now));
        let expired = before - inner.entries.len();

        let mut trimmed = 0;
        if inner.entries.len() > self.max_entries {
            let excess = inner.entries.len() - self.max_entries;
            let mut by_age: Vec<(Instant, String)> = inner
                .entries
                .iter()
                .map(|(k, e)| (e.inserted_at, k.clone()))
                .collect();
            by_age.sort();
            for (_, key) in by_age.into_iter().take(excess) {
                inner.entries.remove(&key);
                trimmed += 1;
            }
        }

        inner.evictions += (expired + trimmed) as u64;
        SweepReport { expired, trimmed }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            entries: inner.entries.len(),
            max_entries: self.max_entries,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
        }
    }

    pub fn reset_stats(&self) {
        let mut inner = self.inner.lock();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    /// Keys sorted by name, expired entries included until swept
    pub fn keys(&self) -> Vec<CacheKeyInfo> {
        let now = Instant::now();
        let inner = self.inner.lock();
        let mut keys: Vec<CacheKeyInfo> = inner
            .entries
            .iter()
            .map(|(k, e)| CacheKeyInfo {
                key: k.clone(),
                age_ms: now.duration_since(e.inserted_at).as_millis() as u64,
                ttl_ms: e.ttl.as_millis() as u64,
            })
            .collect();
        keys.sort_by(|a, b| a.key.cmp(&b.key));
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn cache() -> TtlCache<i32> {
        TtlCache::new(Duration::from_secs(60), 3)
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_before_expiry() {
        let c = cache();
        c.set("a", 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(c.get("a"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_at_expiry_is_miss_and_evicts() {
        let c = cache();
        c.set("a", 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(c.get("a"), None);

        let stats = c.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_timestamp() {
        let c = cache();
        c.set("a", 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        c.set("a", 2, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(c.get("a"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired() {
        let c = cache();
        c.set("short", 1, Duration::from_secs(1));
        c.set("long", 2, Duration::from_secs(100));
        tokio::time::advance(Duration::from_secs(5)).await;

        let report = c.sweep();
        assert_eq!(report, SweepReport { expired: 1, trimmed: 0 });
        assert_eq!(c.get("long"), Some(2));
        assert_eq!(c.stats().entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_trims_oldest_beyond_max() {
        let c = cache();
        for (i, key) in ["k0", "k1", "k2", "k3", "k4"].iter().enumerate() {
            c.set_default(*key, i as i32);
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        let report = c.sweep();
        assert_eq!(report, SweepReport { expired: 0, trimmed: 2 });
        assert_eq!(c.get("k0"), None);
        assert_eq!(c.get("k1"), None);
        assert_eq!(c.get("k2"), Some(2));
        assert_eq!(c.get("k4"), Some(4));
    }

    #[test]
    fn test_invalidate_pattern_only_matching() {
        let c = TtlCache::new(Duration::from_secs(60), 100);
        c.set_default("menu", 0);
        c.set_default("products:1", 1);
        c.set_default("products:2", 2);
        c.set_default("delivery_zones:active", 3);

        let removed = c.invalidate_pattern("^products:").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(c.get("menu"), Some(0));
        assert_eq!(c.get("delivery_zones:active"), Some(3));
        assert_eq!(c.get("products:1"), None);
    }

    #[test]
    fn test_catalog_pattern() {
        let c = TtlCache::new(Duration::from_secs(60), 100);
        c.set_default(keys::MENU, 0);
        c.set_default(keys::CATEGORIES_ALL, 1);
        c.set_default(keys::product(9), 2);
        c.set_default(keys::ZONES_ACTIVE, 3);
        c.set_default(keys::SETTINGS, 4);

        assert_eq!(c.invalidate_pattern(keys::CATALOG_PATTERN).unwrap(), 3);
        assert_eq!(c.get(keys::ZONES_ACTIVE), Some(3));
        assert_eq!(c.invalidate_pattern(keys::ZONES_PATTERN).unwrap(), 1);
        assert_eq!(c.get(keys::SETTINGS), Some(4));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let c = cache();
        let err = c.invalidate_pattern("products:(").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let c = cache();
        c.set_default("a", 1);
        c.set_default("b", 2);
        assert!(c.invalidate("a"));
        assert!(!c.invalidate("a"));
        assert_eq!(c.clear(), 1);
        assert_eq!(c.stats().entries, 0);
    }

    #[test]
    fn test_stats_and_reset() {
        let c = cache();
        c.set_default("a", 1);
        c.get("a");
        c.get("a");
        c.get("missing");

        let stats = c.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);

        c.reset_stats();
        let stats = c.stats();
        assert_eq!((stats.hits, stats.misses, stats.evictions), (0, 0, 0));
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_get_or_load_caches_success_only() {
        let c = cache();
        let v: Result<i32, &str> = c.get_or_load("x", || async { Err("db down") }).await;
        assert!(v.is_err());
        assert_eq!(c.stats().entries, 0);

        let v: Result<i32, &str> = c.get_or_load("x", || async { Ok(7) }).await;
        assert_eq!(v, Ok(7));
        let v: Result<i32, &str> = c.get_or_load("x", || async { Ok(8) }).await;
        assert_eq!(v, Ok(7));
    }

    #[tokio::test]
    async fn test_load_racing_invalidation_is_not_stored() {
        let c = cache();
        let (tx, rx) = tokio::sync::oneshot::channel::<i32>();

        let load = c.get_or_load("delivery_zones:active", || async move {
            Ok::<_, &str>(rx.await.unwrap_or(0))
        });
        let admin_write = async {
            tokio::task::yield_now().await;
            c.invalidate("delivery_zones:active");
            let _ = tx.send(1);
        };
        let (loaded, ()) = tokio::join!(load, admin_write);

        // The caller still gets its value, but the stale read is not kept
        assert_eq!(loaded, Ok(1));
        assert_eq!(c.stats().entries, 0);

        let v: Result<i32, &str> = c.get_or_load("delivery_zones:active", || async { Ok(2) }).await;
        assert_eq!(v, Ok(2));
        assert_eq!(c.get("delivery_zones:active"), Some(2));
    }

    #[tokio::test]
    async fn test_pattern_invalidation_during_load_discards_result() {
        let c = TtlCache::new(Duration::from_secs(60), 100);
        let (tx, rx) = tokio::sync::oneshot::channel::<i32>();

        let load = c.get_or_load("menu", || async move { Ok::<_, &str>(rx.await.unwrap_or(0)) });
        let admin_write = async {
            tokio::task::yield_now().await;
            c.invalidate_pattern(keys::CATALOG_PATTERN).unwrap();
            let _ = tx.send(5);
        };
        let (loaded, ()) = tokio::join!(load, admin_write);
        assert_eq!(loaded, Ok(5));
        assert_eq!(c.get("menu"), None);
    }

    #[test]
    fn test_keys_sorted() {
        let c = cache();
        c.set_default("b", 1);
        c.set_default("a", 2);
        let keys: Vec<String> = c.keys().into_iter().map(|k| k.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
