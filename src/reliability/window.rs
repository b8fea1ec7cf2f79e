use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How a driver resolved a ride offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideOutcome {
    Accepted,
    Rejected,
    Cancelled,
}

/// The three rolling-window horizons tracked per driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    /// 24 hours.
    Short,
    /// 7 days.
    Medium,
    /// 30 days.
    Long,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Short, Horizon::Medium, Horizon::Long];

    /// Length of the counting period for this horizon.
    pub fn duration(self) -> Duration {
        match self {
            Horizon::Short => Duration::hours(24),
            Horizon::Medium => Duration::days(7),
            Horizon::Long => Duration::days(30),
        }
    }

    /// Offset used by the repair tool when rewriting a stale
    /// `window_start`: far enough into the window that the very next
    /// observed event does not trigger another reset, but not so fresh
    /// that the window looks brand new.
    pub fn fresh_offset(self) -> Duration {
        match self {
            Horizon::Short => Duration::hours(1),
            Horizon::Medium => Duration::days(1),
            Horizon::Long => Duration::days(5),
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Horizon::Short => write!(f, "short"),
            Horizon::Medium => write!(f, "medium"),
            Horizon::Long => write!(f, "long"),
        }
    }
}

/// Rolling outcome counters for one horizon.
///
/// Invariant: `now - window_start <= horizon.duration()`. A violation is
/// corrected only by an explicit [`AcceptanceWindow::reset`] inside
/// [`record`](AcceptanceWindow::record), never as a side effect of a read;
/// a `window_start` that stays older than its horizon would otherwise
/// appear perpetually expired and wipe the counts on every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceWindow {
    pub accepted: u32,
    pub rejected: u32,
    pub cancelled: u32,
    pub total: u32,
    /// Cached `accepted / total`, 0.0 when the window is empty.
    pub rate: f64,
    pub window_start: DateTime<Utc>,
}

impl Default for AcceptanceWindow {
    fn default() -> Self {
        Self {
            accepted: 0,
            rejected: 0,
            cancelled: 0,
            total: 0,
            rate: 0.0,
            window_start: Utc::now(),
        }
    }
}

impl AcceptanceWindow {
    /// Returns `true` when the counting period has elapsed for `horizon`.
    pub fn is_expired(&self, horizon: Horizon, now: DateTime<Utc>) -> bool {
        now - self.window_start > horizon.duration()
    }

    /// Clears the counters and starts a fresh counting period at `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.accepted = 0;
        self.rejected = 0;
        self.cancelled = 0;
        self.total = 0;
        self.rate = 0.0;
        self.window_start = now;
    }

    /// Records one outcome, resetting first if the window has expired.
    ///
    /// Returns `true` when a reset occurred so the caller can log the
    /// transition.
    pub fn record(&mut self, outcome: RideOutcome, horizon: Horizon, now: DateTime<Utc>) -> bool {
        let expired = self.is_expired(horizon, now);
        if expired {
            self.reset(now);
        }

        match outcome {
            RideOutcome::Accepted => self.accepted += 1,
            RideOutcome::Rejected => self.rejected += 1,
            RideOutcome::Cancelled => self.cancelled += 1,
        }
        self.total += 1;
        self.rate = self.accepted as f64 / self.total as f64;

        expired
    }
}
