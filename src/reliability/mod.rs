//! Driver reliability tracking.
//!
//! Maintains three rolling acceptance windows per driver (24 h / 7 d /
//! 30 d), derives an acceptance rate and a coarse tier from them, and
//! applies accept/reject/cancel outcomes through the driver repository's
//! atomic per-record mutation contract.

mod metrics;
mod tier;
mod tracker;
mod window;

pub use metrics::DriverMetrics;
pub use tier::{Tier, TierPolicy, TierThreshold};
pub use tracker::ReliabilityTracker;
pub use window::{AcceptanceWindow, Horizon, RideOutcome};
