//! Fee policy
//!
//! Compute budget settings attached to every swap, the default derived from
//! recent network fees, and the sticky value retained after a confirmed trade.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

/// Default compute unit budget for a routed swap
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

/// Default priority fee floor (micro-lamports per compute unit)
pub const DEFAULT_MIN_PRIORITY_FEE: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSettings {
    pub compute_unit_limit: u32,
    /// Micro-lamports per compute unit
    pub priority_fee_per_unit: u64,
}

impl GasSettings {
    pub fn new(compute_unit_limit: u32, priority_fee_per_unit: u64) -> Self {
        Self {
            compute_unit_limit,
            priority_fee_per_unit,
        }
    }

    /// Upper bound of the priority fee in lamports
    pub fn max_priority_fee_lamports(&self) -> u64 {
        (self.compute_unit_limit as u128 * self.priority_fee_per_unit as u128 / 1_000_000) as u64
    }
}

impl std::fmt::Display for GasSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} CU @ {} µlamports/CU",
            self.compute_unit_limit, self.priority_fee_per_unit
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GasPolicy {
    pub compute_unit_limit: u32,
    pub min_priority_fee: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            min_priority_fee: DEFAULT_MIN_PRIORITY_FEE,
        }
    }
}

impl GasPolicy {
    /// Median of the observed fees, floored at the configured minimum
    pub fn from_observed_fees(&self, fees: &[u64]) -> GasSettings {
        let median = if fees.is_empty() {
            0
        } else {
            let data = Data::new(fees.iter().map(|f| *f as f64).collect::<Vec<_>>());
            let m = data.median();
            if m.is_finite() && m > 0.0 {
                m.round() as u64
            } else {
                0
            }
        };

        GasSettings::new(self.compute_unit_limit, median.max(self.min_priority_fee))
    }

    /// Used when the network fee query fails
    pub fn fallback(&self) -> GasSettings {
        GasSettings::new(self.compute_unit_limit, self.min_priority_fee)
    }
}

/// Last settings that produced a confirmed trade. Single writer, many readers.
#[derive(Debug, Default)]
pub struct StickyGas {
    inner: RwLock<Option<GasSettings>>,
}

impl StickyGas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<GasSettings> {
        *self.inner.read()
    }

    pub(crate) fn record_success(&self, settings: GasSettings) {
        *self.inner.write() = Some(settings);
    }
}
