use serde::{Deserialize, Serialize};

use super::metrics::DriverMetrics;
use super::window::Horizon;

/// Coarse reliability classification derived from acceptance history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Bronze => write!(f, "bronze"),
            Tier::Silver => write!(f, "silver"),
            Tier::Gold => write!(f, "gold"),
            Tier::Platinum => write!(f, "platinum"),
        }
    }
}

/// Minimum blended acceptance rate and long-window volume for one tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierThreshold {
    /// Minimum blended acceptance rate, 0.0-1.0.
    pub min_rate: f64,
    /// Minimum number of events in the long-horizon window.
    pub min_long_events: u32,
}

/// Tunable tier classification policy.
///
/// The acceptance rate is blended across the three horizons, weighted
/// toward the long one, then checked against per-tier cutoffs in
/// descending order. The defaults are a starting point; operators adjust
/// them through configuration rather than code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierPolicy {
    pub short_weight: f64,
    pub medium_weight: f64,
    pub long_weight: f64,
    pub platinum: TierThreshold,
    pub gold: TierThreshold,
    pub silver: TierThreshold,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            short_weight: 0.2,
            medium_weight: 0.3,
            long_weight: 0.5,
            platinum: TierThreshold {
                min_rate: 0.90,
                min_long_events: 25,
            },
            gold: TierThreshold {
                min_rate: 0.75,
                min_long_events: 10,
            },
            silver: TierThreshold {
                min_rate: 0.50,
                min_long_events: 0,
            },
        }
    }
}

impl TierPolicy {
    /// Acceptance rate blended across horizons, 0.0-1.0.
    ///
    /// Empty windows contribute their weight with a rate of zero, so a
    /// driver with no history blends to 0.0 rather than being skipped.
    pub fn blended_rate(&self, metrics: &DriverMetrics) -> f64 {
        let weight_sum = self.short_weight + self.medium_weight + self.long_weight;
        if weight_sum <= 0.0 {
            return 0.0;
        }

        let blended = metrics.window(Horizon::Short).rate * self.short_weight
            + metrics.window(Horizon::Medium).rate * self.medium_weight
            + metrics.window(Horizon::Long).rate * self.long_weight;

        blended / weight_sum
    }

    /// Classifies a driver from the blended rate and long-window volume.
    pub fn tier_for(&self, metrics: &DriverMetrics) -> Tier {
        let rate = self.blended_rate(metrics);
        let long_events = metrics.window(Horizon::Long).total;

        match () {
            _ if rate >= self.platinum.min_rate && long_events >= self.platinum.min_long_events => {
                Tier::Platinum
            }
            _ if rate >= self.gold.min_rate && long_events >= self.gold.min_long_events => {
                Tier::Gold
            }
            _ if rate >= self.silver.min_rate && long_events >= self.silver.min_long_events => {
                Tier::Silver
            }
            _ => Tier::Bronze,
        }
    }

    /// Blended rate expressed on a 0-100 scale.
    pub fn reliability_score(&self, metrics: &DriverMetrics) -> f64 {
        self.blended_rate(metrics) * 100.0
    }
}
