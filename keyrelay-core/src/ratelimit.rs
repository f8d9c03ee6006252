use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Injectable rate-limit seam. Keys are caller-defined (tenant id, IP, ...).
///
/// Single-instance deployments use [`FixedWindowLimiter`]; multi-instance
/// deployments can plug in an implementation backed by an external store.
pub trait RateLimiter: Send + Sync {
    fn allow(&self, key: &str) -> bool;
}

/// In-process fixed-window counter.
///
/// The window map is guarded by a plain mutex; the critical section is a
/// couple of map operations and is never held across I/O.
pub struct FixedWindowLimiter {
    window: Duration,
    limit: u32,
    hits: Mutex<HashMap<String, (Instant, u32)>>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            window,
            limit,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter mutex poisoned");

        let entry = hits.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        if entry.1 >= self.limit {
            return false;
        }
        entry.1 += 1;
        true
    }
}

/// Limiter that admits everything. Useful for tests and internal callers.
pub struct NoopLimiter;

impl RateLimiter for NoopLimiter {
    fn allow(&self, _key: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_enforced_within_window() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.allow("tenant-a"));
        assert!(limiter.allow("tenant-a"));
        assert!(limiter.allow("tenant-a"));
        assert!(!limiter.allow("tenant-a"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow("tenant-a"));
        assert!(!limiter.allow("tenant-a"));
        assert!(limiter.allow("tenant-b"));
    }

    #[test]
    fn test_window_resets() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.allow("k"));
        assert!(!limiter.allow("k"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.allow("k"));
    }
}
