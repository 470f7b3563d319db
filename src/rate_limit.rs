use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window rate limiter keyed by session identity. Timestamps older
/// than the window are pruned lazily on each check. Call sites are expected
/// to check before recording; a denied request consumes no slot.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    buckets: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Returns whether another request is allowed and how many slots remain.
    pub fn check(&self, identity: &str) -> (bool, usize) {
        self.check_at(identity, Instant::now())
    }

    /// Record a consumed slot for `identity`.
    pub fn record(&self, identity: &str) {
        self.record_at(identity, Instant::now());
    }

    fn check_at(&self, identity: &str, now: Instant) -> (bool, usize) {
        let mut buckets = self.buckets.lock().unwrap();
        // Checks alone must not allocate: only record_at inserts buckets.
        let used = match buckets.get_mut(identity) {
            Some(timestamps) => {
                timestamps.retain(|ts| now.duration_since(*ts) < self.window);
                timestamps.len()
            }
            None => 0,
        };

        (used < self.max_requests, self.max_requests.saturating_sub(used))
    }

    fn record_at(&self, identity: &str, now: Instant) {
        let mut buckets = self.buckets.lock().unwrap();
        buckets.entry(identity.to_string()).or_default().push(now);
    }

    #[cfg(test)]
    fn tracked_identities(&self) -> usize {
        self.buckets.lock().unwrap().len()
    }
}
