use std::collections::HashMap;

use tracing::debug;

use crate::geo::haversine_km;
use crate::models::{Driver, GeoPoint};

/// Filters drivers down to in-radius candidates with their distance from
/// the pickup point.
///
/// Drivers with a missing or malformed location are excluded rather than
/// failing the pass. An empty result is the reportable "no candidates"
/// condition, not an error.
pub fn select_candidates(
    pickup: GeoPoint,
    radius_km: f64,
    drivers: &[Driver],
) -> HashMap<String, f64> {
    let mut candidates = HashMap::new();

    for driver in drivers {
        let Some(location) = driver.location else {
            debug!(driver_id = %driver.id, "candidate has no location, excluded");
            continue;
        };
        if !location.is_well_formed() {
            debug!(driver_id = %driver.id, "candidate location malformed, excluded");
            continue;
        }
        if !driver.rating.is_finite() {
            debug!(driver_id = %driver.id, "candidate rating malformed, excluded");
            continue;
        }

        let distance_km = haversine_km(pickup, location);
        if !distance_km.is_finite() || distance_km > radius_km {
            debug!(
                driver_id = %driver.id,
                distance_km,
                radius_km,
                "candidate out of radius, excluded"
            );
            continue;
        }

        candidates.insert(driver.id.clone(), distance_km);
    }

    candidates
}
