use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Derive a cache key from an operation name and its arguments. JSON
/// serialization keeps distinct argument lists from colliding.
pub fn cache_key(operation: &str, args: &[&str]) -> String {
    let args = serde_json::to_string(args).expect("Failed to serialize cache key arguments");
    format!("{}:{}", operation, args)
}

/// In-memory memoization store with per-call expiry. Entries are never
/// evicted, only logically expired on read and overwritten on recompute.
pub struct ResultCache<V> {
    entries: Mutex<HashMap<String, (V, Instant)>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> Self {
        ResultCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if it is younger than `duration`,
    /// otherwise run `compute` and store its result. The lock is released
    /// while `compute` runs; concurrent misses on the same key may both
    /// compute, last writer wins.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, duration: Duration, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        {
            let entries = self.entries.lock().unwrap();
            if let Some((value, created_at)) = entries.get(key) {
                if created_at.elapsed() < duration {
                    tracing::debug!(key, "Cache hit");
                    return value.clone();
                }
            }
        }

        let value = compute().await;

        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value.clone(), Instant::now()));
        value
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_lookup_within_duration_skips_compute() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            "value".to_string()
        };

        let first = cache
            .get_or_compute("k", Duration::from_secs(60), compute)
            .await;
        let second = cache
            .get_or_compute("k", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                "other".to_string()
            })
            .await;

        assert_eq!(first, "value");
        assert_eq!(second, "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed_and_overwritten() {
        let cache = ResultCache::new();

        let first = cache
            .get_or_compute("k", Duration::ZERO, || async { 1u32 })
            .await;
        let second = cache
            .get_or_compute("k", Duration::ZERO, || async { 2u32 })
            .await;

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_collide() {
        let cache = ResultCache::new();
        let d = Duration::from_secs(60);

        let a = cache.get_or_compute("op:a", d, || async { "a" }).await;
        let b = cache.get_or_compute("op:b", d, || async { "b" }).await;

        assert_eq!(a, "a");
        assert_eq!(b, "b");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let cache = ResultCache::new();
        cache
            .get_or_compute("k", Duration::from_secs(60), || async { 1u32 })
            .await;

        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_keys_distinguish_argument_boundaries() {
        assert_ne!(cache_key("op", &["ab", "c"]), cache_key("op", &["a", "bc"]));
        assert_ne!(cache_key("op_a", &["x"]), cache_key("op_b", &["x"]));
        assert_eq!(cache_key("op", &["x"]), cache_key("op", &["x"]));
    }
}
