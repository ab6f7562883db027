use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process TTL cache for computed read models
///
/// Read-through usage: callers `get`, recompute on miss, then `put`.
/// Concurrent identical misses may both recompute; that is acceptable
/// because the cached computations are pure reads. Entries are evicted
/// lazily on access.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch a live entry, dropping it if expired
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }

        None
    }

    /// Store a value under `key` for the configured TTL
    pub fn put(&self, key: &str, value: V) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop a single entry
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of entries currently held (live and expired)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_stored_value_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 1u32);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = TtlCache::new(Duration::from_millis(0));
        cache.put("a", 1u32);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 1u32);
        cache.put("a", 2u32);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 1u32);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
    }
}
