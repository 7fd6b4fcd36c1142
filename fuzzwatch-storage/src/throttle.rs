//! Refetch throttling.
//!
//! Notifications can arrive in bursts (two mutations back to back, a
//! coalesced cross-tab delivery followed by a keyed one). A consumer that
//! refetches on notification guards the refetch with a [`Throttle`] so a
//! burst costs one network call.

use dashmap::DashMap;
use fuzzwatch_core::{elapsed_since, SharedClock, Timestamp};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Cooldown state for one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    last_fired_at: Option<Timestamp>,
    min_interval: Duration,
}

impl RateWindow {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_fired_at: None,
            min_interval,
        }
    }

    /// Returns true and records `now` when nothing has fired yet or strictly
    /// more than `min_interval` has passed since the last firing. Otherwise
    /// returns false and leaves the window untouched.
    pub fn should_proceed(&mut self, now: Timestamp) -> bool {
        let proceed = match self.last_fired_at {
            None => true,
            Some(last) => elapsed_since(now, last) > self.min_interval,
        };
        if proceed {
            self.last_fired_at = Some(now);
        }
        proceed
    }

    pub fn last_fired_at(&self) -> Option<Timestamp> {
        self.last_fired_at
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn reset(&mut self) {
        self.last_fired_at = None;
    }
}

/// A named, clock-bound [`RateWindow`] shareable between handlers.
#[derive(Debug)]
pub struct Throttle {
    name: String,
    window: Mutex<RateWindow>,
    clock: SharedClock,
}

impl Throttle {
    pub fn new(name: impl Into<String>, min_interval: Duration, clock: SharedClock) -> Self {
        Self {
            name: name.into(),
            window: Mutex::new(RateWindow::new(min_interval)),
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the guarded action may run now.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let proceed = window.should_proceed(now);
        if !proceed {
            debug!(operation = %self.name, "Throttled");
        }
        proceed
    }

    pub fn reset(&self) {
        self.window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .reset();
    }
}

/// Throttles keyed by operation name, so unrelated operations never share a
/// window.
#[derive(Debug, Clone)]
pub struct ThrottleSet {
    throttles: Arc<DashMap<String, Arc<Throttle>>>,
    default_interval: Duration,
    clock: SharedClock,
}

impl ThrottleSet {
    pub fn new(default_interval: Duration, clock: SharedClock) -> Self {
        Self {
            throttles: Arc::new(DashMap::new()),
            default_interval,
            clock,
        }
    }

    /// Get or create the throttle for `operation` with the default interval.
    pub fn get(&self, operation: &str) -> Arc<Throttle> {
        self.get_with_interval(operation, self.default_interval)
    }

    /// Get or create the throttle for `operation`. The interval only applies
    /// when the throttle is created.
    pub fn get_with_interval(&self, operation: &str, min_interval: Duration) -> Arc<Throttle> {
        let throttle = self
            .throttles
            .entry(operation.to_string())
            .or_insert_with(|| {
                Arc::new(Throttle::new(operation, min_interval, Arc::clone(&self.clock)))
            });
        Arc::clone(throttle.value())
    }

    pub fn try_acquire(&self, operation: &str) -> bool {
        self.get(operation).try_acquire()
    }

    pub fn len(&self) -> usize {
        self.throttles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.throttles.is_empty()
    }
}
