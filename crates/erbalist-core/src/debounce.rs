//! Edit debouncing.
//!
//! Bursts of edit events collapse into one recomputation once the document has been quiet for
//! the configured interval. The debouncer owns no timer: the host passes the current instant to
//! [`Debouncer::schedule`] and [`Debouncer::poll`], which keeps it deterministic under test.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Per-key trailing-edge debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    quiet: Duration,
    deadlines: BTreeMap<K, Instant>,
}

impl<K: Ord + Clone> Debouncer<K> {
    /// Create a debouncer with the given quiet interval.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadlines: BTreeMap::new(),
        }
    }

    /// The quiet interval.
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Change the quiet interval. Already scheduled deadlines are kept.
    pub fn set_quiet(&mut self, quiet: Duration) {
        self.quiet = quiet;
    }

    /// Record an event for `key`, pushing its deadline to `now + quiet`.
    pub fn schedule(&mut self, key: K, now: Instant) {
        self.deadlines.insert(key, now + self.quiet);
    }

    /// Forget a pending key.
    pub fn cancel(&mut self, key: &K) {
        self.deadlines.remove(key);
    }

    /// Returns `true` if `key` is waiting for its quiet interval.
    pub fn is_pending(&self, key: &K) -> bool {
        self.deadlines.contains_key(key)
    }

    /// The earliest pending deadline, for hosts that arm a single timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key whose deadline has passed, in key order.
    pub fn poll(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.deadlines.remove(key);
        }
        due
    }
}
