//! Limit-resolution strategies.
//!
//! A provider adapter decides what "limit" means through exactly one of
//! these policies:
//!
//! - [`LimitStrategy::Direct`]: usage and limit are read from the response
//! - [`LimitStrategy::HeuristicEstimated`]: limit is inferred from [`LimitBands`]
//! - [`LimitStrategy::CostProportional`]: usage is an imputed share of a cost,
//!   see [`allocate_cost`]
//!
//! Heuristic and cost-proportional results are approximations. Metrics
//! produced by them are flagged `derived` and must not be used for alerting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// ============================================================================
// Strategy
// ============================================================================

/// Which policy produced a metric's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStrategy {
    /// Both numbers come verbatim from the provider.
    Direct,
    /// Limit estimated from usage bands.
    HeuristicEstimated,
    /// Usage imputed from an aggregate cost.
    CostProportional,
}

impl LimitStrategy {
    /// Returns true if the strategy approximates upstream truth.
    pub fn is_derived(&self) -> bool {
        !matches!(self, Self::Direct)
    }

    /// Returns the snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::HeuristicEstimated => "heuristic_estimated",
            Self::CostProportional => "cost_proportional",
        }
    }
}

impl fmt::Display for LimitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Heuristic Bands
// ============================================================================

/// One `(usage threshold -> assumed plan limit)` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitBand {
    /// Usage threshold of the band.
    pub threshold: u64,
    /// Plan limit assumed for usage falling in this band.
    pub limit: u64,
}

impl LimitBand {
    /// Creates a band.
    pub const fn new(threshold: u64, limit: u64) -> Self {
        Self { threshold, limit }
    }
}

/// Ordered band table used by the heuristic-estimated strategy.
///
/// Always non-empty and sorted by ascending threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LimitBand>", into = "Vec<LimitBand>")]
pub struct LimitBands(Vec<LimitBand>);

const DEFAULT_BANDS: [LimitBand; 5] = [
    LimitBand::new(0, 10_000),
    LimitBand::new(15_000, 20_000),
    LimitBand::new(50_000, 100_000),
    LimitBand::new(100_000, 300_000),
    LimitBand::new(500_000, 1_000_000),
];

impl LimitBands {
    /// Builds a table, sorting by threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if `bands` is empty.
    pub fn new(mut bands: Vec<LimitBand>) -> Result<Self, CoreError> {
        if bands.is_empty() {
            return Err(CoreError::InvalidConfig(
                "limit band table must not be empty".to_string(),
            ));
        }
        bands.sort_by_key(|band| band.threshold);
        Ok(Self(bands))
    }

    /// Returns the bands in ascending threshold order.
    pub fn bands(&self) -> &[LimitBand] {
        &self.0
    }

    /// Estimates the plan limit for an observed usage.
    ///
    /// Selects the first band whose threshold reaches the observed usage, so
    /// usage at or below the lowest threshold maps to the lowest band. Usage
    /// above every threshold maps to the highest band.
    pub fn estimate(&self, usage: u64) -> u64 {
        self.0
            .iter()
            .find(|band| band.threshold >= usage)
            .or_else(|| self.0.last())
            .map_or(0, |band| band.limit)
    }
}

impl Default for LimitBands {
    fn default() -> Self {
        Self(DEFAULT_BANDS.to_vec())
    }
}

impl TryFrom<Vec<LimitBand>> for LimitBands {
    type Error = CoreError;

    fn try_from(bands: Vec<LimitBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<LimitBands> for Vec<LimitBand> {
    fn from(bands: LimitBands) -> Self {
        bands.0
    }
}

// ============================================================================
// Cost-Proportional Allocation
// ============================================================================

/// Splits an aggregate cost across credentials by their share of usage.
///
/// For usage `u_i` and total `U`, credential `i` receives `floor(cost * u_i / U)`.
/// The returned vector has the same order and length as `usages`.
///
/// # Errors
///
/// Returns [`CoreError::Derivation`] when the total usage is zero or the cost
/// is negative or not finite.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn allocate_cost(cost: f64, usages: &[u64]) -> Result<Vec<u64>, CoreError> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(CoreError::Derivation(format!(
            "aggregate cost must be a non-negative number, got {cost}"
        )));
    }
    let total: u128 = usages.iter().map(|&u| u128::from(u)).sum();
    if total == 0 {
        return Err(CoreError::Derivation(
            "aggregate usage is zero, cannot allocate cost".to_string(),
        ));
    }
    let total = total as f64;
    Ok(usages
        .iter()
        .map(|&usage| (cost * usage as f64 / total).floor() as u64)
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
