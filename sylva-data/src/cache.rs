use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A thread-safe, size-bounded cache backed by `DashMap`.
///
/// Each entry carries the tick of its last access; inserting into a full
/// cache evicts the least-recently-used entry. Concurrent inserts may race on
/// eviction, which only costs a redundant eviction or re-insert.
#[derive(Clone)]
pub struct BoundedCache<K, V> {
    inner: Arc<DashMap<K, (V, AtomicU64)>>,
    clock: Arc<AtomicU64>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(DashMap::with_capacity(capacity)),
            clock: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Get a cached value, marking it as recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.inner.get(key)?;
        let (value, last_used) = entry.value();
        last_used.store(self.tick(), Ordering::Relaxed);
        Some(value.clone())
    }

    /// Insert or replace a value, evicting the least-recently-used entries
    /// while the cache is over capacity.
    pub fn insert(&self, key: K, value: V) {
        let tick = self.tick();
        self.inner.insert(key.clone(), (value, AtomicU64::new(tick)));
        while self.inner.len() > self.capacity {
            if !self.evict_oldest(&key) {
                break;
            }
        }
    }

    /// Return the cached value for `key`, computing and caching it on a miss.
    /// Errors are returned as-is and never cached.
    pub fn get_or_try_insert<E>(&self, key: &K, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = compute()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    fn evict_oldest(&self, keep: &K) -> bool {
        let oldest = self
            .inner
            .iter()
            .filter(|entry| entry.key() != keep)
            .min_by_key(|entry| entry.value().1.load(Ordering::Relaxed))
            .map(|entry| entry.key().clone());
        match oldest {
            Some(key) => self.inner.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries from the cache.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_insert() {
        let cache = BoundedCache::new(4);
        assert!(cache.get(&"a").is_none());
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        cache.insert("a", 2);
        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        // touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get(&"a"), Some(1));
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(&"a"));
        assert!(!cache.contains_key(&"b"));
        assert!(cache.contains_key(&"c"));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let cache = BoundedCache::new(8);
        for i in 0..100 {
            cache.insert(i, i * 2);
        }
        assert_eq!(cache.len(), 8);
        assert_eq!(cache.get(&99), Some(198));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: BoundedCache<&str, i32> = BoundedCache::new(2);
        let err: Result<i32, &str> = cache.get_or_try_insert(&"k", || Err("bad"));
        assert_eq!(err, Err("bad"));
        assert!(cache.is_empty());

        let ok: Result<i32, &str> = cache.get_or_try_insert(&"k", || Ok(5));
        assert_eq!(ok, Ok(5));
        let hit: Result<i32, &str> = cache.get_or_try_insert(&"k", || Err("unused"));
        assert_eq!(hit, Ok(5));
    }

    #[test]
    fn test_concurrent_access_stays_bounded() {
        let cache = BoundedCache::new(16);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("{t}-{i}");
                        cache.insert(key.clone(), i);
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 16 + 4);
    }
}
