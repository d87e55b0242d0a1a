//! Adapter-local time-boxed cache

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Cached value with its own expiration window
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: Instant,
    expiration: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.cached_at) >= self.expiration
    }
}

/// String-keyed cache where every entry carries its own TTL
///
/// Expired entries are dropped when read, before every write, and when
/// [`DataCache::clear_expired`] runs; fresh entries survive a sweep. The
/// cache therefore never holds more than the entries written within one TTL.
#[derive(Debug)]
pub struct DataCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    default_ttl: Duration,
}

impl<T: Clone> DataCache<T> {
    /// Create an empty cache
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// TTL applied by [`DataCache::set`]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Fresh value for `key`, removing it if it has expired
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.data.clone()),
            Some(_) => {}
        }

        // Shard guard released above; removing under it would deadlock
        self.entries.remove(key);
        None
    }

    /// Store `data` with the default TTL
    pub fn set(&self, key: impl Into<String>, data: T) {
        self.set_with_ttl(key, data, self.default_ttl);
    }

    /// Store `data` with an explicit TTL, pruning expired entries first
    pub fn set_with_ttl(&self, key: impl Into<String>, data: T, expiration: Duration) {
        self.clear_expired();
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                cached_at: Instant::now(),
                expiration,
            },
        );
    }

    /// Drop expired entries only, returning how many were removed
    pub fn clear_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_read() {
        let cache = DataCache::new(Duration::from_millis(100));
        cache.set("k", 1u32);
        assert_eq!(cache.get("k"), Some(1));

        tokio::time::advance(Duration::from_millis(101)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_expired_keeps_fresh_entries() {
        let cache = DataCache::new(Duration::from_secs(300));
        cache.set_with_ttl("short", "a", Duration::from_millis(10));
        cache.set("long", "b");

        tokio::time::advance(Duration::from_millis(20)).await;

        assert_eq!(cache.clear_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_prune_expired_entries() {
        let cache = DataCache::new(Duration::from_millis(100));
        for i in 0..50u32 {
            cache.set(format!("snapshot_{}", i), i);
            tokio::time::advance(Duration::from_millis(101)).await;
        }

        assert_eq!(cache.len(), 1);
        cache.set("fresh", 99);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(99));
    }
}
