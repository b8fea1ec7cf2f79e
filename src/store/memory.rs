use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DriverRepository, MetricsMutation, RideRequestRepository};
use crate::models::{Driver, NearbyDriverSummary, NotifiedDriver, RequestStatus, RideRequest};
use crate::reliability::DriverMetrics;

/// Driver registry backed by a map. Serves the CLI (documents loaded from
/// JSON files) and the test suites.
///
/// Each mutating method holds the write lock for the whole
/// read-modify-write, which is what gives `with_metrics` and the status
/// CAS their atomicity here.
#[derive(Default)]
pub struct InMemoryDriverStore {
    drivers: RwLock<HashMap<String, Driver>>,
}

impl InMemoryDriverStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, driver: Driver) {
        self.drivers.write().await.insert(driver.id.clone(), driver);
    }

    /// All driver documents, ordered by id (for stable JSON write-back).
    pub async fn snapshot(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self.drivers.read().await.values().cloned().collect();
        drivers.sort_by(|a, b| a.id.cmp(&b.id));
        drivers
    }
}

#[async_trait]
impl DriverRepository for InMemoryDriverStore {
    async fn available_drivers(&self) -> Result<Vec<Driver>> {
        Ok(self
            .drivers
            .read()
            .await
            .values()
            .filter(|d| d.is_online && d.is_available)
            .cloned()
            .collect())
    }

    async fn get(&self, driver_id: &str) -> Result<Option<Driver>> {
        Ok(self.drivers.read().await.get(driver_id).cloned())
    }

    async fn all_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.drivers.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn with_metrics(
        &self,
        driver_id: &str,
        apply: MetricsMutation,
    ) -> Result<Option<DriverMetrics>> {
        let mut drivers = self.drivers.write().await;
        let Some(driver) = drivers.get_mut(driver_id) else {
            return Ok(None);
        };
        apply(&mut driver.metrics);
        Ok(Some(driver.metrics.clone()))
    }
}

/// Ride-request store backed by a map.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<String, RideRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, request: RideRequest) {
        self.requests
            .write()
            .await
            .insert(request.id.clone(), request);
    }
}

#[async_trait]
impl RideRequestRepository for InMemoryRequestStore {
    async fn get(&self, request_id: &str) -> Result<Option<RideRequest>> {
        Ok(self.requests.read().await.get(request_id).cloned())
    }

    async fn mark_no_drivers(&self, request_id: &str) -> Result<()> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(request_id)
            .ok_or_else(|| anyhow!("ride request '{request_id}' not found"))?;

        request.no_drivers_available = true;
        request.nearby_drivers.clear();
        request.search_attempts += 1;
        Ok(())
    }

    async fn try_mark_notified(
        &self,
        request_id: &str,
        notified: NotifiedDriver,
        nearby: Vec<NearbyDriverSummary>,
    ) -> Result<bool> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(request_id)
            .ok_or_else(|| anyhow!("ride request '{request_id}' not found"))?;

        if request.status != RequestStatus::Searching {
            return Ok(false);
        }

        request.status = RequestStatus::DriverNotified;
        request.notified_driver_id = Some(notified.driver_id);
        request.notified_driver_tier = Some(notified.tier);
        request.notified_driver_priority = Some(notified.priority_score);
        request.notification_time = Some(notified.notification_time);
        request.no_drivers_available = false;
        request.nearby_drivers = nearby;
        request.search_attempts += 1;
        Ok(true)
    }
}
