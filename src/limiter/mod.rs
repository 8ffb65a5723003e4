//! Fixed-window request limiting.
//!
//! One [`FixedWindowLimiter`] exists per route group (and one for per-user AI
//! quotas). Each owns a bounded [`WindowStore`] and reads time through a
//! [`Clock`] so tests can step over window boundaries.

pub mod store;

pub use store::{Admission, WindowStore};

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::{RateLimitConfig, RateLimitSettings};

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for driving limiters across windows in tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    group: String,
    max_requests: u32,
    window: Duration,
    store: WindowStore,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(
        group: impl Into<String>,
        quota: RateLimitConfig,
        settings: &RateLimitSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            group: group.into(),
            max_requests: quota.max_requests,
            window: Duration::from_secs(quota.window_secs),
            store: WindowStore::new(settings.max_tracked_keys, settings.sweep_interval),
            clock,
        }
    }

    pub fn admit(&self, key: &str) -> Admission {
        let admission = self
            .store
            .admit(key, self.clock.now(), self.window, self.max_requests);

        match admission {
            Admission::Admitted { remaining } => {
                tracing::debug!(group = %self.group, key, remaining, "request admitted");
            }
            Admission::Rejected { retry_after } => {
                tracing::warn!(
                    group = %self.group,
                    key,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "rate limit exceeded"
                );
            }
        }

        admission
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}
