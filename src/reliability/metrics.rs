use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tier::{Tier, TierPolicy};
use super::window::{AcceptanceWindow, Horizon, RideOutcome};

/// A driver's reliability aggregate: one rolling window per horizon plus
/// the tier and score derived from them.
///
/// Owned exclusively by the reliability tracker; nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverMetrics {
    pub short: AcceptanceWindow,
    pub medium: AcceptanceWindow,
    pub long: AcceptanceWindow,
    pub tier: Tier,
    pub reliability_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for DriverMetrics {
    fn default() -> Self {
        Self {
            short: AcceptanceWindow::default(),
            medium: AcceptanceWindow::default(),
            long: AcceptanceWindow::default(),
            tier: Tier::Bronze,
            reliability_score: 0.0,
            last_updated: Utc::now(),
        }
    }
}

impl DriverMetrics {
    pub fn window(&self, horizon: Horizon) -> &AcceptanceWindow {
        match horizon {
            Horizon::Short => &self.short,
            Horizon::Medium => &self.medium,
            Horizon::Long => &self.long,
        }
    }

    pub fn window_mut(&mut self, horizon: Horizon) -> &mut AcceptanceWindow {
        match horizon {
            Horizon::Short => &mut self.short,
            Horizon::Medium => &mut self.medium,
            Horizon::Long => &mut self.long,
        }
    }

    /// Applies one outcome to all three windows, each checked against its
    /// own expiry, then recomputes the tier and reliability score.
    ///
    /// Returns the horizons whose windows were reset so the caller can log
    /// each reset as an explicit transition.
    pub fn observe(
        &mut self,
        outcome: RideOutcome,
        now: DateTime<Utc>,
        policy: &TierPolicy,
    ) -> Vec<Horizon> {
        let mut resets = Vec::new();
        for horizon in Horizon::ALL {
            if self.window_mut(horizon).record(outcome, horizon, now) {
                resets.push(horizon);
            }
        }

        self.tier = policy.tier_for(self);
        self.reliability_score = policy.reliability_score(self);
        self.last_updated = now;

        resets
    }

    /// Returns the horizons whose windows currently violate the freshness
    /// invariant (`window_start` older than the horizon duration).
    pub fn stale_horizons(&self, now: DateTime<Utc>) -> Vec<Horizon> {
        Horizon::ALL
            .into_iter()
            .filter(|&h| self.window(h).is_expired(h, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_observe_updates_all_windows() {
        let now = Utc::now();
        let policy = TierPolicy::default();
        let mut m = DriverMetrics::default();

        let resets = m.observe(RideOutcome::Accepted, now, &policy);

        assert!(resets.is_empty());
        for horizon in Horizon::ALL {
            assert_eq!(m.window(horizon).total, 1);
            assert_eq!(m.window(horizon).accepted, 1);
            assert_eq!(m.window(horizon).rate, 1.0);
        }
        assert_eq!(m.last_updated, now);
    }

    #[test]
    fn test_observe_n_times_totals_n() {
        let now = Utc::now();
        let policy = TierPolicy::default();
        let mut m = DriverMetrics::default();

        for i in 0..10 {
            let outcome = if i % 2 == 0 {
                RideOutcome::Accepted
            } else {
                RideOutcome::Rejected
            };
            m.observe(outcome, now, &policy);
        }

        assert_eq!(m.window(Horizon::Long).total, 10);
        assert_eq!(m.window(Horizon::Long).rate, 0.5);
    }

    #[test]
    fn test_observe_resets_only_expired_horizons() {
        let now = Utc::now();
        let policy = TierPolicy::default();
        let mut m = DriverMetrics::default();
        for w in [&mut m.short, &mut m.medium, &mut m.long] {
            w.accepted = 4;
            w.total = 4;
            w.rate = 1.0;
            w.window_start = now - Duration::days(2);
        }

        let resets = m.observe(RideOutcome::Accepted, now, &policy);

        assert_eq!(resets, vec![Horizon::Short]);
        assert_eq!(m.window(Horizon::Short).total, 1);
        assert_eq!(m.window(Horizon::Medium).total, 5);
        assert_eq!(m.window(Horizon::Long).total, 5);
    }

    #[test]
    fn test_stale_horizons_reports_violations() {
        let now = Utc::now();
        let mut m = DriverMetrics::default();
        m.long.window_start = now - Duration::days(31);

        assert_eq!(m.stale_horizons(now), vec![Horizon::Long]);
    }

    #[test]
    fn test_observe_recomputes_tier() {
        let now = Utc::now();
        let policy = TierPolicy::default();
        let mut m = DriverMetrics::default();

        for _ in 0..30 {
            m.observe(RideOutcome::Accepted, now, &policy);
        }

        assert_eq!(m.tier, Tier::Platinum);
        assert_eq!(m.reliability_score, 100.0);
    }
}
