//! Per-user token-bucket rate limiting for model-backed commands.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::UserId;

#[derive(Clone, Copy, Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

/// Token bucket per user. Default sizing matches the original cooldown of
/// one request per five seconds; rejection carries a retry hint and mutates
/// no other state.
pub struct RateLimiter {
    enabled: bool,
    max_tokens: f64,
    refill_per_sec: f64,
    buckets: HashMap<UserId, Bucket>,
}

impl RateLimiter {
    pub fn new(enabled: bool, max_tokens: u32, window: Duration) -> Self {
        // A zero-sized bucket would never refill and the retry hint would
        // divide by zero; the smallest meaningful bucket is one request.
        let max_tokens_f = f64::from(max_tokens.max(1));
        let window_secs = window.as_secs_f64().max(1e-9);

        Self {
            enabled,
            max_tokens: max_tokens_f,
            refill_per_sec: max_tokens_f / window_secs,
            buckets: HashMap::new(),
        }
    }

    /// Returns whether the request may proceed, and the wait time when not.
    pub fn check(&mut self, user_id: &UserId) -> (bool, Option<Duration>) {
        self.check_at(user_id, Instant::now())
    }

    pub fn check_at(&mut self, user_id: &UserId, now: Instant) -> (bool, Option<Duration>) {
        if !self.enabled {
            return (true, None);
        }

        let bucket = self.buckets.entry(user_id.clone()).or_insert(Bucket {
            tokens: self.max_tokens,
            last_update: now,
        });

        let elapsed = now.duration_since(bucket.last_update).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return (true, None);
        }

        let secs = (1.0 - bucket.tokens) / self.refill_per_sec;
        (false, Some(Duration::from_secs_f64(secs.max(0.0))))
    }
}
