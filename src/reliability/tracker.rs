use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::metrics::DriverMetrics;
use super::tier::TierPolicy;
use super::window::RideOutcome;
use crate::store::DriverRepository;

/// Applies ride outcomes to driver metrics through the repository's
/// atomic per-record mutation contract.
///
/// Updated by the trip-resolution collaborator whenever a driver accepts,
/// rejects, or cancels; the dispatch engine only reads its output.
pub struct ReliabilityTracker {
    drivers: Arc<dyn DriverRepository>,
    policy: TierPolicy,
}

impl ReliabilityTracker {
    pub fn new(drivers: Arc<dyn DriverRepository>, policy: TierPolicy) -> Self {
        Self { drivers, policy }
    }

    /// Records one outcome against all three of the driver's windows.
    ///
    /// A driver with no metrics aggregate gets an all-zero one starting
    /// now. A missing driver record is logged and skipped (`Ok(None)`);
    /// only store failures propagate.
    pub async fn observe(
        &self,
        driver_id: &str,
        outcome: RideOutcome,
    ) -> Result<Option<DriverMetrics>> {
        let now = Utc::now();
        let policy = self.policy.clone();

        // The closure runs inside the store's atomic application; the
        // audit trail (window resets, tier movement) is captured out
        // through the cell and logged after the write commits.
        let audit = Arc::new(Mutex::new(None));
        let audit_in = audit.clone();

        let updated = self
            .drivers
            .with_metrics(
                driver_id,
                Box::new(move |metrics| {
                    let previous_tier = metrics.tier;
                    let resets = metrics.observe(outcome, now, &policy);
                    if let Ok(mut slot) = audit_in.lock() {
                        *slot = Some((previous_tier, resets));
                    }
                }),
            )
            .await?;

        let Some(metrics) = updated else {
            warn!(driver_id, ?outcome, "outcome for unknown driver, skipping");
            return Ok(None);
        };

        if let Some((previous_tier, resets)) = audit.lock().ok().and_then(|mut s| s.take()) {
            for horizon in resets {
                info!(
                    driver_id,
                    %horizon,
                    "acceptance window expired, reset to current event"
                );
            }
            if previous_tier != metrics.tier {
                info!(
                    driver_id,
                    from = %previous_tier,
                    to = %metrics.tier,
                    "driver tier changed"
                );
            }
        }

        debug!(
            driver_id,
            ?outcome,
            tier = %metrics.tier,
            long_rate = metrics.long.rate,
            "outcome recorded"
        );

        Ok(Some(metrics))
    }
}
