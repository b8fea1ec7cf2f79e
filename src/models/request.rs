use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoPoint;
use crate::reliability::Tier;

/// Ride request lifecycle states.
///
/// This core owns only the `Searching -> DriverNotified` transition; the
/// remaining states are written by the driver-response collaborator and
/// are carried here so its documents round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Searching,
    DriverNotified,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

/// An address with resolved coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub address: String,
    pub location: GeoPoint,
}

/// An intermediate stop with its expected waiting time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub address: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub waiting_minutes: u32,
}

/// Per-candidate summary persisted after each search cycle for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDriverSummary {
    pub driver_id: String,
    pub distance_km: f64,
    pub tier: Tier,
    pub priority_score: f64,
    pub acceptance_rate: f64,
}

/// The winning candidate of a search cycle, recorded on the request at the
/// moment of the `Searching -> DriverNotified` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedDriver {
    pub driver_id: String,
    pub tier: Tier,
    pub priority_score: f64,
    pub notification_time: DateTime<Utc>,
}

/// A ride request document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    pub id: String,
    pub status: RequestStatus,
    pub pickup: Place,
    pub dropoff: Place,
    /// Ordered intermediate stops. The notification payload truncates to
    /// five; the document itself keeps them all.
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub fare_estimate: f64,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default)]
    pub notified_driver_id: Option<String>,
    #[serde(default)]
    pub notified_driver_tier: Option<Tier>,
    #[serde(default)]
    pub notified_driver_priority: Option<f64>,
    #[serde(default)]
    pub notification_time: Option<DateTime<Utc>>,
    /// Monotonically advancing stamp set by the external refresh trigger.
    #[serde(default)]
    pub search_refreshed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub search_attempts: u32,
    #[serde(default)]
    pub no_drivers_available: bool,
    #[serde(default)]
    pub nearby_drivers: Vec<NearbyDriverSummary>,
}

impl RideRequest {
    /// Sum of waiting time across all stops, in minutes.
    pub fn total_waiting_minutes(&self) -> u32 {
        self.stops.iter().map(|s| s.waiting_minutes).sum()
    }
}
