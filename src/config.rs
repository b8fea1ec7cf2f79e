//! Engine configuration.
//!
//! All tunables live here: search radius, score weights, tier thresholds,
//! and the response-expiry hint carried in notification payloads. Loaded
//! from a plain JSON file; missing fields fall back to the documented
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dispatch::PriorityWeights;
use crate::reliability::TierPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Candidate search radius around the pickup point.
    pub search_radius_km: f64,
    /// Response-window hint included in the offer payload. The driver
    /// client enforces the actual timeout.
    pub response_expiry_seconds: u32,
    pub weights: PriorityWeights,
    pub tier_policy: TierPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            search_radius_km: 5.0,
            response_expiry_seconds: 30,
            weights: PriorityWeights::default(),
            tier_policy: TierPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config file '{path}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = DispatchConfig::default();
        assert_eq!(config.search_radius_km, 5.0);
        assert_eq!(config.weights.distance_max, 50.0);
        assert_eq!(config.weights.tier_platinum, 15.0);
        assert_eq!(config.tier_policy.long_weight, 0.5);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: DispatchConfig = serde_json::from_str(r#"{"searchRadiusKm": 8.0}"#).unwrap();
        assert_eq!(config.search_radius_km, 8.0);
        assert_eq!(config.response_expiry_seconds, 30);
        assert_eq!(config.weights.acceptance_max, 20.0);
    }
}
