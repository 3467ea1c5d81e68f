// Per-IP sliding-window rate limiting for the REST surface.
//
// Counters live in process memory and reset on restart. This limiter is
// transport-level and separate from the store-backed admission gate.

use dashmap::DashMap;
use std::time::{Duration, Instant};

pub struct SlidingWindowLimiter {
    window: Duration,
    max_hits: usize,
    hits: DashMap<String, Vec<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_hits: usize) -> Self {
        Self {
            window,
            max_hits,
            hits: DashMap::new(),
        }
    }

    /// 10 review submissions per source IP per 15 minutes.
    pub fn for_reviews() -> Self {
        Self::new(Duration::from_secs(15 * 60), 10)
    }

    /// 30 share events per source IP per hour.
    pub fn for_shares() -> Self {
        Self::new(Duration::from_secs(60 * 60), 30)
    }

    /// Records a hit for `key` and reports whether it is within the limit.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self.hits.entry(key.to_string()).or_default();
        entry.retain(|hit| now.duration_since(*hit) < self.window);
        if entry.len() >= self.max_hits {
            return false;
        }
        entry.push(now);
        true
    }
}
