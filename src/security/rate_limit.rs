//! Fixed-window rate limiter with bounded memory.
//!
//! # Responsibilities
//! - Count hits per key inside fixed windows of `window_ms`
//! - Report whether a hit exceeds `max_attempts`
//! - Keep at most `max_keys` keys, evicting the least recently used
//! - Sweep expired windows lazily, at most once per `cleanup_interval_ms`
//!
//! # Design Decisions
//! - Fixed window, not sliding: a hit never moves `reset_at`
//! - No background task; the sweep piggybacks on `hit()`
//! - Time is passed in as Unix milliseconds so tests are deterministic
//! - One instance per process; callers wrap it in a mutex

use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;

use crate::security::client_ip::UNKNOWN_CLIENT;

/// Default spacing between expired-entry sweeps (30 seconds).
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 30 * 1000;

/// Limiter construction parameters. All values are expected to be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOptions {
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Hits allowed per window before requests are limited.
    pub max_attempts: u32,
    /// Maximum number of distinct keys retained.
    pub max_keys: usize,
    /// Minimum spacing between sweeps; `None` means 30 seconds.
    pub cleanup_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: u64,
    last_seen_at: u64,
}

/// Outcome of a single [`FixedWindowRateLimiter::hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether this hit exceeded the allowance.
    pub limited: bool,
    /// Hits recorded in the current window, this one included.
    pub count: u32,
    /// Hits still allowed in the current window.
    pub remaining: u32,
    /// Absolute end of the current window (Unix ms).
    pub reset_at: u64,
}

impl RateLimitDecision {
    /// Seconds until the window resets, rounded up and never below 1.
    /// Suitable for a `Retry-After` header.
    pub fn retry_after_secs(&self, now: u64) -> u64 {
        let wait_ms = self.reset_at.saturating_sub(now);
        wait_ms.div_ceil(1000).max(1)
    }
}

/// In-memory fixed-window limiter keyed by opaque strings.
pub struct FixedWindowRateLimiter {
    /// Iteration order is recency: the LRU end is the eviction candidate.
    entries: LruCache<String, RateLimitEntry>,
    options: RateLimitOptions,
    cleanup_interval_ms: u64,
    last_cleanup_at: u64,
}

impl FixedWindowRateLimiter {
    pub fn new(options: RateLimitOptions) -> Self {
        Self {
            entries: LruCache::unbounded(),
            cleanup_interval_ms: options
                .cleanup_interval_ms
                .unwrap_or(DEFAULT_CLEANUP_INTERVAL_MS),
            options,
            last_cleanup_at: 0,
        }
    }

    /// Record a hit for `key` at `now` (Unix ms) and decide whether it is limited.
    ///
    /// Blank keys share the `"unknown"` bucket.
    pub fn hit(&mut self, key: &str, now: u64) -> RateLimitDecision {
        let trimmed = key.trim();
        let key = if trimmed.is_empty() { UNKNOWN_CLIENT } else { trimmed };

        self.maybe_cleanup(now);

        let entry = match self.entries.peek(key) {
            Some(current) if now <= current.reset_at => RateLimitEntry {
                count: current.count.saturating_add(1),
                reset_at: current.reset_at,
                last_seen_at: now,
            },
            _ => RateLimitEntry {
                count: 1,
                reset_at: now.saturating_add(self.options.window_ms),
                last_seen_at: now,
            },
        };

        // `push` replaces an existing value and moves the key to the MRU end.
        self.entries.push(key.to_string(), entry);
        self.enforce_max_keys();

        RateLimitDecision {
            limited: entry.count > self.options.max_attempts,
            count: entry.count,
            remaining: self.options.max_attempts.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// [`hit`](Self::hit) using the wall clock.
    pub fn hit_now(&mut self, key: &str) -> RateLimitDecision {
        self.hit(key, now_millis())
    }

    /// Number of distinct keys currently stored.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn options(&self) -> &RateLimitOptions {
        &self.options
    }

    fn maybe_cleanup(&mut self, now: u64) {
        if now.saturating_sub(self.last_cleanup_at) < self.cleanup_interval_ms {
            return;
        }
        self.last_cleanup_at = now;

        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.reset_at < now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.pop(key);
        }

        if !expired.is_empty() {
            tracing::debug!(
                removed = expired.len(),
                remaining = self.entries.len(),
                "Swept expired rate limit entries"
            );
        }
    }

    fn enforce_max_keys(&mut self) {
        while self.entries.len() > self.options.max_keys {
            match self.entries.pop_lru() {
                Some((evicted, entry)) => {
                    tracing::trace!(
                        key = %evicted,
                        last_seen_at = entry.last_seen_at,
                        "Evicted least recently used rate limit entry"
                    );
                }
                None => break,
            }
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
