use serde::Serialize;

use crate::models::RideRequest;

/// Stops included in the notification payload are capped here; the request
/// document keeps the full list. Truncation happens at this serialization
/// boundary only.
pub const MAX_PAYLOAD_STOPS: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSummary {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSummary {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub waiting_minutes: u32,
}

/// The structured ride offer delivered to the chosen driver.
///
/// `schema_version` gates client-side parsing; bump it when the field set
/// changes shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOfferPayload {
    pub schema_version: u8,
    pub request_id: String,
    pub pickup: PlaceSummary,
    pub dropoff: PlaceSummary,
    pub fare_estimate: f64,
    pub distance_km: f64,
    pub duration_minutes: f64,
    /// At most [`MAX_PAYLOAD_STOPS`] entries, in route order.
    pub stops: Vec<StopSummary>,
    /// Aggregate waiting time across all stops, including any truncated
    /// out of `stops`.
    pub total_waiting_minutes: u32,
    /// Hint only; the driver client enforces the actual response window.
    pub expires_in_seconds: u32,
}

impl RideOfferPayload {
    pub fn from_request(request: &RideRequest, expires_in_seconds: u32) -> Self {
        let stops = request
            .stops
            .iter()
            .take(MAX_PAYLOAD_STOPS)
            .map(|s| StopSummary {
                address: s.address.clone(),
                latitude: s.location.latitude,
                longitude: s.location.longitude,
                waiting_minutes: s.waiting_minutes,
            })
            .collect();

        Self {
            schema_version: 1,
            request_id: request.id.clone(),
            pickup: PlaceSummary {
                address: request.pickup.address.clone(),
                latitude: request.pickup.location.latitude,
                longitude: request.pickup.location.longitude,
            },
            dropoff: PlaceSummary {
                address: request.dropoff.address.clone(),
                latitude: request.dropoff.location.latitude,
                longitude: request.dropoff.location.longitude,
            },
            fare_estimate: request.fare_estimate,
            distance_km: request.distance_km,
            duration_minutes: request.duration_minutes,
            stops,
            total_waiting_minutes: request.total_waiting_minutes(),
            expires_in_seconds,
        }
    }

    /// Number of stops dropped by the payload cap for this request.
    pub fn truncated_stops(request: &RideRequest) -> usize {
        request.stops.len().saturating_sub(MAX_PAYLOAD_STOPS)
    }
}
