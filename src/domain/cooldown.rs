//! Per-token cooldown gate
//!
//! Concurrent TTL map keyed by token id. A token admitted at time T is
//! refused until T + window, which makes aggregation and decision at most
//! once per token per window regardless of how many mentions arrive.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Maximum tracked tokens before expired entries are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug)]
pub struct CooldownGate {
    window: Duration,
    admitted: DashMap<String, Instant>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            admitted: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit `token_id` if it is not cooling down. Atomic per token.
    pub fn try_admit(&self, token_id: &str) -> bool {
        self.try_admit_at(token_id, Instant::now())
    }

    pub fn try_admit_at(&self, token_id: &str, now: Instant) -> bool {
        if self.admitted.len() >= SWEEP_THRESHOLD {
            self.sweep(now);
        }

        match self.admitted.entry(token_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) < self.window {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Time left before `token_id` may be admitted again
    pub fn remaining(&self, token_id: &str) -> Option<Duration> {
        self.remaining_at(token_id, Instant::now())
    }

    pub fn remaining_at(&self, token_id: &str, now: Instant) -> Option<Duration> {
        self.admitted.get(token_id).and_then(|admitted_at| {
            let elapsed = now.saturating_duration_since(*admitted_at);
            self.window.checked_sub(elapsed).filter(|d| !d.is_zero())
        })
    }

    /// Drop entries whose window has elapsed
    pub fn sweep(&self, now: Instant) {
        let window = self.window;
        self.admitted
            .retain(|_, admitted_at| now.saturating_duration_since(*admitted_at) < window);
    }

    pub fn len(&self) -> usize {
        self.admitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty()
    }
}
