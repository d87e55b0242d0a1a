//! Time-expiring result cache with verification on read

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use twox_hash::xxh3::hash64;
use types::{EditorToFormResult, FormToEditorResult, TransformationStrategy};

/// Results that can re-derive a fingerprint of their significant fields
pub trait Verifiable {
    fn verification_hash(&self) -> u64;
}

fn significant_hash(content: &str, is_completed: bool, success: bool, strategy: TransformationStrategy) -> u64 {
    let mut buf = Vec::with_capacity(content.len() + 32);
    buf.extend_from_slice(content.as_bytes());
    buf.push(0);
    buf.push(u8::from(is_completed));
    buf.push(u8::from(success));
    buf.extend_from_slice(strategy.as_str().as_bytes());
    hash64(&buf)
}

impl Verifiable for EditorToFormResult {
    fn verification_hash(&self) -> u64 {
        significant_hash(
            &self.transformed_content,
            self.transformed_is_completed,
            self.transformation_success,
            self.strategy,
        )
    }
}

impl Verifiable for FormToEditorResult {
    fn verification_hash(&self) -> u64 {
        significant_hash(
            &self.editor_content,
            self.editor_is_completed,
            self.transformation_success,
            self.strategy,
        )
    }
}

/// A cached result and the fingerprint it had when stored
#[derive(Debug, Clone)]
pub struct CacheEntry<R> {
    pub result: R,
    pub inserted_at: Instant,
    pub strategy: TransformationStrategy,
    pub hash: u64,
}

/// Counter snapshot for one cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCounters {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub integrity_evictions: u64,
}

enum Lookup<R> {
    Absent,
    Expired,
    Corrupted,
    Hit(R),
}

/// Keyed result cache
///
/// An entry is served only while younger than the TTL and only if its
/// result still hashes to the fingerprint recorded at insertion. Anything
/// else is evicted and reported as a miss.
pub struct VerifiedCache<R> {
    name: &'static str,
    entries: DashMap<u64, CacheEntry<R>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    integrity_evictions: AtomicU64,
}

impl<R: Verifiable + Clone> VerifiedCache<R> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            integrity_evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: u64) -> Option<R> {
        let now = Instant::now();

        // Decide while holding the shard guard, mutate after releasing it.
        let lookup = match self.entries.get(&key) {
            None => Lookup::Absent,
            Some(entry) if now.saturating_duration_since(entry.inserted_at) >= self.ttl => {
                Lookup::Expired
            }
            Some(entry) if entry.result.verification_hash() != entry.hash => Lookup::Corrupted,
            Some(entry) => Lookup::Hit(entry.result.clone()),
        };

        match lookup {
            Lookup::Hit(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(result);
            }
            Lookup::Absent => {}
            Lookup::Expired => {
                self.entries.remove(&key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                debug!("{} cache entry {:016x} expired", self.name, key);
            }
            Lookup::Corrupted => {
                self.entries.remove(&key);
                self.integrity_evictions.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "{} cache entry {:016x} failed verification, evicted",
                    self.name, key
                );
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: u64, result: R, strategy: TransformationStrategy) {
        let hash = result.verification_hash();
        self.entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
                strategy,
                hash,
            },
        );
    }

    /// Drop every entry older than the TTL, returning how many went
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: u64) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn counters(&self) -> CacheCounters {
        CacheCounters {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            integrity_evictions: self.integrity_evictions.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn entry_mut(&self, key: u64) -> Option<dashmap::mapref::one::RefMut<'_, u64, CacheEntry<R>>> {
        self.entries.get_mut(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(content: &str) -> EditorToFormResult {
        EditorToFormResult {
            transformed_content: content.to_string(),
            transformed_is_completed: true,
            transformation_success: true,
            transformation_errors: Vec::new(),
            strategy: TransformationStrategy::ExistingContent,
            transformed_at: 1,
            metadata: Default::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_past_ttl_is_a_miss_and_removed() {
        let cache = VerifiedCache::new("test", Duration::from_millis(1000));
        cache.insert(1, result("hello"), TransformationStrategy::ExistingContent);

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(cache.get(1).is_some());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(cache.get(1).is_none());
        assert!(!cache.contains_key(1));

        let counters = cache.counters();
        assert_eq!(counters.hits, 1);
        assert_eq!(counters.misses, 1);
        assert_eq!(counters.expirations, 1);
    }

    #[tokio::test]
    async fn test_in_place_mutation_is_detected() {
        let cache = VerifiedCache::new("test", Duration::from_secs(60));
        cache.insert(7, result("trusted"), TransformationStrategy::ExistingContent);

        if let Some(mut entry) = cache.entry_mut(7) {
            entry.result.transformed_content.push_str(" tampered");
        }

        assert!(cache.get(7).is_none());
        assert!(!cache.contains_key(7));
        assert_eq!(cache.counters().integrity_evictions, 1);
    }

    #[tokio::test]
    async fn test_non_significant_fields_do_not_break_verification() {
        let cache = VerifiedCache::new("test", Duration::from_secs(60));
        cache.insert(3, result("stable"), TransformationStrategy::ExistingContent);

        if let Some(mut entry) = cache.entry_mut(3) {
            entry.result.transformed_at = 99;
        }

        assert!(cache.get(3).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = VerifiedCache::new("test", Duration::from_millis(100));
        cache.insert(1, result("old"), TransformationStrategy::ExistingContent);
        tokio::time::advance(Duration::from_millis(150)).await;
        cache.insert(2, result("fresh"), TransformationStrategy::ExistingContent);

        assert_eq!(cache.sweep_expired(), 1);
        assert!(cache.contains_key(2));
        assert!(!cache.contains_key(1));
    }
}
