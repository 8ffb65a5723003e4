//! Bounded per-key timestamp storage for the fixed-window limiters.
//!
//! Keys come from client addresses and user ids, so the map cannot be allowed
//! to grow without limit. Stale keys (nothing recorded inside the window) are
//! swept every `sweep_interval` calls and whenever a new key would exceed
//! `max_keys`; if the map is still full the least recently active key is evicted.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Outcome of one admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

#[derive(Debug)]
pub struct WindowStore {
    entries: DashMap<String, VecDeque<Instant>>,
    max_keys: usize,
    sweep_interval: u64,
    calls: AtomicU64,
}

impl WindowStore {
    pub fn new(max_keys: usize, sweep_interval: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_keys: max_keys.max(1),
            sweep_interval: sweep_interval.max(1),
            calls: AtomicU64::new(0),
        }
    }

    /// Prune, check and record for `key` as one step under the key's shard lock.
    pub fn admit(&self, key: &str, now: Instant, window: Duration, max_requests: u32) -> Admission {
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % self.sweep_interval == 0 {
            self.sweep(now, window);
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_keys {
            self.sweep(now, window);
            if self.entries.len() >= self.max_keys {
                self.evict_least_recent();
            }
        }

        let mut timestamps = self.entries.entry(key.to_string()).or_default();
        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        let used = timestamps.len() as u32;
        if used < max_requests {
            timestamps.push_back(now);
            Admission::Admitted {
                remaining: max_requests - used - 1,
            }
        } else {
            let retry_after = timestamps
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            Admission::Rejected { retry_after }
        }
    }

    /// Drop every key with no timestamp inside the window. Returns how many went.
    pub fn sweep(&self, now: Instant, window: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "swept stale rate limit keys");
        }
        removed
    }

    fn evict_least_recent(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().back().copied())
            .map(|entry| entry.key().clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
            tracing::debug!(key = %key, "evicted least recently active rate limit key");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
