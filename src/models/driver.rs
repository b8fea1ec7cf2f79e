use serde::{Deserialize, Serialize};

use crate::reliability::DriverMetrics;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns `true` if both coordinates are finite and within the valid
    /// degree ranges. Candidates with anything else are excluded from
    /// selection rather than fed into the distance calculation.
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A driver document from the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub is_online: bool,
    pub is_available: bool,
    /// Last known location. Missing or malformed locations exclude the
    /// driver from candidate selection.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Passenger star rating, 0-5.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub push_token: Option<String>,
    #[serde(default)]
    pub metrics: DriverMetrics,
}
