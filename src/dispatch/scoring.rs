use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Driver;
use crate::reliability::{Horizon, Tier};

/// Tunable weights for the composite priority score.
///
/// Defaults produce the documented 0-100 scale: distance up to 50 points
/// (zero at 10 km), tier up to 15, long-horizon acceptance rate up to 20,
/// passenger rating up to 15.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriorityWeights {
    pub distance_max: f64,
    /// Points subtracted per kilometer from `distance_max`.
    pub distance_km_penalty: f64,
    pub tier_platinum: f64,
    pub tier_gold: f64,
    pub tier_silver: f64,
    pub tier_bronze: f64,
    pub acceptance_max: f64,
    pub rating_max: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            distance_max: 50.0,
            distance_km_penalty: 5.0,
            tier_platinum: 15.0,
            tier_gold: 10.0,
            tier_silver: 5.0,
            tier_bronze: 0.0,
            acceptance_max: 20.0,
            rating_max: 15.0,
        }
    }
}

impl PriorityWeights {
    pub fn distance_points(&self, distance_km: f64) -> f64 {
        (self.distance_max - distance_km * self.distance_km_penalty).max(0.0)
    }

    pub fn tier_points(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Platinum => self.tier_platinum,
            Tier::Gold => self.tier_gold,
            Tier::Silver => self.tier_silver,
            Tier::Bronze => self.tier_bronze,
        }
    }

    /// `rate` is the long-horizon acceptance rate as a fraction, 0.0-1.0.
    pub fn acceptance_points(&self, rate: f64) -> f64 {
        rate.clamp(0.0, 1.0) * self.acceptance_max
    }

    /// `stars` is the passenger rating, 0-5.
    pub fn rating_points(&self, stars: f64) -> f64 {
        (stars / 5.0).clamp(0.0, 1.0) * self.rating_max
    }
}

/// One candidate with its score and the inputs that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub driver_id: String,
    pub distance_km: f64,
    pub tier: Tier,
    /// Long-horizon acceptance rate, 0.0-1.0.
    pub acceptance_rate: f64,
    pub score: f64,
}

/// Scores a single candidate at the given distance from the pickup.
pub fn score_candidate(
    driver: &Driver,
    distance_km: f64,
    weights: &PriorityWeights,
) -> ScoredCandidate {
    let tier = driver.metrics.tier;
    let acceptance_rate = driver.metrics.window(Horizon::Long).rate;

    let score = weights.distance_points(distance_km)
        + weights.tier_points(tier)
        + weights.acceptance_points(acceptance_rate)
        + weights.rating_points(driver.rating);

    ScoredCandidate {
        driver_id: driver.id.clone(),
        distance_km,
        tier,
        acceptance_rate,
        score,
    }
}

/// Ranks all candidates strictly descending by score.
///
/// Exact ties break ascending by driver id so the ordering is stable and
/// deterministic for a given input set; re-running on unchanged input
/// yields the same ranking. Drivers absent from `distances` are ignored.
pub fn rank_candidates(
    drivers: &[Driver],
    distances: &HashMap<String, f64>,
    weights: &PriorityWeights,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = drivers
        .iter()
        .filter_map(|d| {
            distances
                .get(&d.id)
                .map(|&distance_km| score_candidate(d, distance_km, weights))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    ranked
}
