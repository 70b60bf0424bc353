//! Fetch statistics tracking.
//!
//! This module provides thread-safe counters for the notable events of the
//! fetch pipeline (redirects, cache hits, loop suppression, fallbacks).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FetchEvent;

/// Thread-safe fetch statistics tracker.
///
/// Uses one atomic counter per `FetchEvent`, all initialized to zero, so the
/// tracker can be shared across concurrent navigations behind an `Arc`.
pub struct FetchStats {
    events: HashMap<FetchEvent, AtomicUsize>,
}

impl FetchStats {
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in FetchEvent::iter() {
            events.insert(event, AtomicUsize::new(0));
        }
        FetchStats { events }
    }

    /// Increment the counter for an event.
    pub fn increment(&self, event: FetchEvent) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in FetchStats initialization.",
                event
            );
        }
    }

    /// Get the count for an event.
    pub fn count(&self, event: FetchEvent) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total(&self) -> usize {
        self.events.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Non-zero counters in declaration order.
    pub fn snapshot(&self) -> Vec<(FetchEvent, usize)> {
        FetchEvent::iter()
            .map(|event| (event, self.count(event)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.snapshot()).finish()
    }
}
