//! Repository seams for the driver registry and ride-request store.
//!
//! The storage engine itself is an external collaborator; the dispatch
//! core only sees these traits. Implementations must uphold two
//! guarantees: `with_metrics` applies its mutation atomically per driver
//! record, and `try_mark_notified` performs the `Searching ->
//! DriverNotified` transition as a compare-and-swap so a lost race is
//! observable by the caller.

mod memory;

pub use memory::{InMemoryDriverStore, InMemoryRequestStore};

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Driver, NearbyDriverSummary, NotifiedDriver, RideRequest};
use crate::reliability::DriverMetrics;

/// Mutation applied atomically to one driver's metrics aggregate.
pub type MetricsMutation = Box<dyn FnOnce(&mut DriverMetrics) + Send>;

#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Drivers flagged both online and available.
    async fn available_drivers(&self) -> Result<Vec<Driver>>;

    async fn get(&self, driver_id: &str) -> Result<Option<Driver>>;

    async fn all_ids(&self) -> Result<Vec<String>>;

    /// Applies `apply` to the driver's metrics under the store's
    /// per-record application guarantee. Returns the updated aggregate,
    /// or `None` if no such driver exists. The read-check-reset-increment
    /// sequence inside the closure must not interleave with another
    /// mutation of the same record.
    async fn with_metrics(
        &self,
        driver_id: &str,
        apply: MetricsMutation,
    ) -> Result<Option<DriverMetrics>>;
}

#[async_trait]
pub trait RideRequestRepository: Send + Sync {
    async fn get(&self, request_id: &str) -> Result<Option<RideRequest>>;

    /// Records a search cycle that found no candidates: sets
    /// `noDriversAvailable`, clears the nearby summaries, and bumps
    /// `searchAttempts`. Status is left untouched.
    async fn mark_no_drivers(&self, request_id: &str) -> Result<()>;

    /// Compare-and-swap transition `Searching -> DriverNotified`.
    ///
    /// Persists the notified-driver fields and the ranked summaries and
    /// bumps `searchAttempts`, but only if the request still has status
    /// `Searching`. Returns `false` when the swap lost (status already
    /// moved on), which is the sole double-notify guard.
    async fn try_mark_notified(
        &self,
        request_id: &str,
        notified: NotifiedDriver,
        nearby: Vec<NearbyDriverSummary>,
    ) -> Result<bool>;
}
