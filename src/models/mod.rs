//! Document types shared across the dispatch core.
//!
//! These mirror the JSON documents the driver registry and ride-request
//! store expose, so every type carries serde derives with `camelCase`
//! field names.

mod driver;
mod request;

pub use driver::{Driver, GeoPoint};
pub use request::{
    NearbyDriverSummary, NotifiedDriver, Place, RequestStatus, RideRequest, Stop,
};
