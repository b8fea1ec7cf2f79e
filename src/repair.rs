//! Offline metrics repair tool.
//!
//! A window whose `windowStart` predates its horizon looks perpetually
//! expired: every new event resets the counts instead of once per elapsed
//! horizon. This tool rewrites stale `windowStart` values to a
//! fresh-but-not-brand-new timestamp while preserving the counts exactly,
//! so the tracker stops re-resetting on the next event. Operator-invoked;
//! never part of the live dispatch path.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::reliability::Horizon;
use crate::store::DriverRepository;

/// Result of repairing one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// At least one stale window was rewritten.
    Repaired,
    /// All windows were already fresh.
    Skipped,
}

/// Counts for a whole-registry sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub repaired: usize,
    pub skipped: usize,
    pub errored: usize,
}

pub struct MetricsRepair {
    drivers: Arc<dyn DriverRepository>,
}

impl MetricsRepair {
    pub fn new(drivers: Arc<dyn DriverRepository>) -> Self {
        Self { drivers }
    }

    /// Returns whether any of the driver's windows violate the freshness
    /// invariant.
    pub async fn needs_repair(&self, driver_id: &str) -> Result<bool> {
        let driver = self
            .drivers
            .get(driver_id)
            .await?
            .ok_or_else(|| anyhow!("driver '{driver_id}' not found"))?;

        Ok(!driver.metrics.stale_horizons(Utc::now()).is_empty())
    }

    /// Rewrites each stale window's start to `now - fresh offset`, keeping
    /// all counts. Fresh windows are untouched, which makes a second run
    /// a no-op.
    pub async fn fix_one(&self, driver_id: &str) -> Result<RepairOutcome> {
        let now = Utc::now();

        let repaired_horizons = Arc::new(Mutex::new(Vec::new()));
        let repaired_out = repaired_horizons.clone();

        let updated = self
            .drivers
            .with_metrics(
                driver_id,
                Box::new(move |metrics| {
                    let mut repaired = Vec::new();
                    for horizon in Horizon::ALL {
                        let window = metrics.window_mut(horizon);
                        if window.is_expired(horizon, now) {
                            window.window_start = now - horizon.fresh_offset();
                            repaired.push(horizon);
                        }
                    }
                    if let Ok(mut slot) = repaired_out.lock() {
                        *slot = repaired;
                    }
                }),
            )
            .await?;

        if updated.is_none() {
            return Err(anyhow!("driver '{driver_id}' not found"));
        }

        let repaired = repaired_horizons
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default();
        if repaired.is_empty() {
            info!(driver_id, "windows already fresh, skipped");
            return Ok(RepairOutcome::Skipped);
        }

        for horizon in &repaired {
            info!(driver_id, %horizon, "stale window start rewritten");
        }
        Ok(RepairOutcome::Repaired)
    }

    /// Repairs every driver in the registry. Per-driver failures are
    /// counted and logged but never abort the sweep.
    pub async fn fix_all(&self) -> Result<RepairSummary> {
        let ids = self.drivers.all_ids().await?;
        let mut summary = RepairSummary::default();

        for driver_id in ids {
            match self.fix_one(&driver_id).await {
                Ok(RepairOutcome::Repaired) => summary.repaired += 1,
                Ok(RepairOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    error!(driver_id, error = %e, "repair failed");
                    summary.errored += 1;
                }
            }
        }

        info!(
            repaired = summary.repaired,
            skipped = summary.skipped,
            errored = summary.errored,
            "repair sweep complete"
        );
        Ok(summary)
    }
}
