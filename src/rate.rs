//! Per-key sliding-window hit counting.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::collections::VecDeque;

use crate::session::now_ms;

/// Sliding time window of hit timestamps per key.
///
/// Trimming is lazy: each [`hit`](RateLimiter::hit) drops timestamps that
/// fell out of the window before counting. Distinct keys are capped at
/// `max_keys` with arbitrary eviction at capacity, since adversarial key
/// enumeration (spoofed `x-forwarded-for`) would otherwise grow the map
/// without bound.
pub struct RateLimiter {
    hits: DashMap<String, VecDeque<u64>>,
    window_ms: u64,
    max_keys: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            hits: DashMap::new(),
            window_ms: config.window_ms,
            max_keys: config.max_keys,
        }
    }

    /// Record a hit for `key` and return the number of hits currently
    /// inside the window, including this one.
    pub fn hit(&self, key: &str) -> usize {
        self.hit_at(key, now_ms())
    }

    fn hit_at(&self, key: &str, now: u64) -> usize {
        if !self.hits.contains_key(key) && self.hits.len() >= self.max_keys {
            self.evict_one();
        }

        let mut window = self.hits.entry(key.to_string()).or_default();
        window.push_back(now);
        while let Some(&oldest) = window.front() {
            if now.saturating_sub(oldest) > self.window_ms {
                window.pop_front();
            } else {
                break;
            }
        }
        window.len()
    }

    fn evict_one(&self) {
        // The iterator guard must be dropped before `remove`, or the shard
        // read lock deadlocks against the write lock.
        let key = self.hits.iter().next().map(|entry| entry.key().clone());
        if let Some(key) = key {
            self.hits.remove(&key);
        }
    }

    /// Number of distinct keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max_keys: usize) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max: 120,
            max_keys,
        })
    }

    #[test]
    fn test_hit_counts_within_window() {
        let limiter = limiter(60_000, 1_000);
        assert_eq!(limiter.hit("1.2.3.4|UA"), 1);
        assert_eq!(limiter.hit("1.2.3.4|UA"), 2);
        assert_eq!(limiter.hit("other|UA"), 1);
    }

    #[test]
    fn test_old_hits_fall_out_of_window() {
        let limiter = limiter(1_000, 1_000);
        let now = now_ms();
        assert_eq!(limiter.hit_at("k", now), 1);
        assert_eq!(limiter.hit_at("k", now + 500), 2);
        // First hit is now 1001ms old, outside the window
        assert_eq!(limiter.hit_at("k", now + 1_001), 2);
        // Everything but the latest expires
        assert_eq!(limiter.hit_at("k", now + 10_000), 1);
    }

    #[test]
    fn test_boundary_hit_still_counts() {
        let limiter = limiter(1_000, 1_000);
        let now = now_ms();
        limiter.hit_at("k", now);
        // Exactly window_ms old is still inside the window
        assert_eq!(limiter.hit_at("k", now + 1_000), 2);
    }

    #[test]
    fn test_121st_hit_returns_121() {
        let limiter = limiter(60_000, 1_000);
        let now = now_ms();
        let mut last = 0;
        for i in 0..121 {
            last = limiter.hit_at("1.2.3.4|UA", now + i);
        }
        assert_eq!(last, 121);
    }

    #[test]
    fn test_key_cap_evicts_at_capacity() {
        let limiter = limiter(60_000, 3);
        limiter.hit("a");
        limiter.hit("b");
        limiter.hit("c");
        assert_eq!(limiter.key_count(), 3);
        limiter.hit("d");
        assert_eq!(limiter.key_count(), 3);
    }

    #[test]
    fn test_existing_key_not_blocked_by_cap() {
        let limiter = limiter(60_000, 2);
        limiter.hit("a");
        limiter.hit("b");
        assert_eq!(limiter.hit("a"), 2);
        assert_eq!(limiter.key_count(), 2);
    }
}
