//! Swap Event Tracker
//!
//! Rolling history of decoded swap events for the watched pool, with a
//! cumulative volume counter and a short-window volume trend.

use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;

/// Default number of swaps kept in the rolling history
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default number of most recent samples used for the trend mean
pub const DEFAULT_TREND_WINDOW: usize = 5;

/// One decoded swap against a pool. Produced by the log decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapEvent {
    /// Pool the swap executed against
    pub pool_id: String,
    /// Swap size in base-asset units (SOL)
    pub amount: Decimal,
    /// Monotonic observation time
    pub observed_at: Instant,
}

impl SwapEvent {
    pub fn new(pool_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            pool_id: pool_id.into(),
            amount,
            observed_at: Instant::now(),
        }
    }
}

/// Direction of recent swap volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolumeTrend {
    /// Fewer samples than the trend window
    Insufficient,
    Rising,
    Falling,
    Stable,
}

impl VolumeTrend {
    pub fn label(&self) -> &'static str {
        match self {
            VolumeTrend::Insufficient => "Insufficient data",
            VolumeTrend::Rising => "Rising Activity",
            VolumeTrend::Falling => "Falling Activity",
            VolumeTrend::Stable => "Stable",
        }
    }
}

impl std::fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Capacity-bounded ring of swap events. Appends at the tail, evicts at the head.
#[derive(Debug, Clone)]
pub struct MarketHistory {
    events: VecDeque<SwapEvent>,
    capacity: usize,
}

impl MarketHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, returning the evicted head if the ring was full
    pub fn push(&mut self, event: SwapEvent) -> Option<SwapEvent> {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first iterator over retained events
    pub fn iter(&self) -> impl Iterator<Item = &SwapEvent> {
        self.events.iter()
    }

    /// The last `n` volumes, oldest first
    pub fn recent_volumes(&self, n: usize) -> Vec<Decimal> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).map(|e| e.amount).collect()
    }
}

/// Point-in-time view of the tracker for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSnapshot {
    pub samples: usize,
    pub total_volume: Decimal,
    pub last_amount: Option<Decimal>,
    pub trend: VolumeTrend,
}

struct TrackerState {
    history: MarketHistory,
    total_volume: Decimal,
}

/// Consumes swap events for one pool. Ingestion is serialized behind a lock,
/// so it is safe to call from concurrent stream callbacks.
pub struct SwapEventTracker {
    pool_id: String,
    trend_window: usize,
    state: Mutex<TrackerState>,
}

impl SwapEventTracker {
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self::with_config(pool_id, DEFAULT_HISTORY_CAPACITY, DEFAULT_TREND_WINDOW)
    }

    pub fn with_config(pool_id: impl Into<String>, capacity: usize, trend_window: usize) -> Self {
        Self {
            pool_id: pool_id.into(),
            trend_window: trend_window.max(1),
            state: Mutex::new(TrackerState {
                history: MarketHistory::with_capacity(capacity),
                total_volume: Decimal::ZERO,
            }),
        }
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    /// Record a swap. Events for other pools are ignored and return false.
    pub fn ingest(&self, event: SwapEvent) -> bool {
        if event.pool_id != self.pool_id {
            tracing::trace!(pool = %event.pool_id, "ignoring swap for unwatched pool");
            return false;
        }

        let amount = event.amount;
        let mut state = self.state.lock();
        state.history.push(event);
        state.total_volume += amount;

        tracing::debug!(
            amount = %amount,
            total_volume = %state.total_volume,
            "Swap detected"
        );
        true
    }

    /// Compare the latest sample against the mean of the trend window
    pub fn trend(&self) -> VolumeTrend {
        let state = self.state.lock();
        compute_trend(&state.history, self.trend_window)
    }

    pub fn total_volume(&self) -> Decimal {
        self.state.lock().total_volume
    }

    pub fn len(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the retained history, oldest first
    pub fn history(&self) -> Vec<SwapEvent> {
        self.state.lock().history.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = self.state.lock();
        TrackerSnapshot {
            samples: state.history.len(),
            total_volume: state.total_volume,
            last_amount: state.history.iter().last().map(|e| e.amount),
            trend: compute_trend(&state.history, self.trend_window),
        }
    }
}

fn compute_trend(history: &MarketHistory, window: usize) -> VolumeTrend {
    if history.len() < window {
        return VolumeTrend::Insufficient;
    }

    let volumes = history.recent_volumes(window);
    let sum: Decimal = volumes.iter().copied().sum();
    let mean = sum / Decimal::from(volumes.len());
    let current = match volumes.last() {
        Some(v) => *v,
        None => return VolumeTrend::Insufficient,
    };

    if current > mean {
        VolumeTrend::Rising
    } else if current < mean {
        VolumeTrend::Falling
    } else {
        VolumeTrend::Stable
    }
}
