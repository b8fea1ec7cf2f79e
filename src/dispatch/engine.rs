use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::payload::RideOfferPayload;
use super::scoring::{ScoredCandidate, rank_candidates};
use super::selector::select_candidates;
use crate::config::DispatchConfig;
use crate::models::{Driver, NearbyDriverSummary, NotifiedDriver, RequestStatus, RideRequest};
use crate::push::{PushMessage, PushSender};
use crate::store::{DriverRepository, RideRequestRepository};

/// Orchestrates one search cycle per trigger: candidate selection,
/// scoring, the `Searching -> DriverNotified` transition, and best-effort
/// notification of the winner.
///
/// Owns request status transitions and the notified-driver fields; nothing
/// else writes them.
pub struct DispatchEngine {
    drivers: Arc<dyn DriverRepository>,
    requests: Arc<dyn RideRequestRepository>,
    push: Arc<dyn PushSender>,
    config: DispatchConfig,
}

impl DispatchEngine {
    pub fn new(
        drivers: Arc<dyn DriverRepository>,
        requests: Arc<dyn RideRequestRepository>,
        push: Arc<dyn PushSender>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            drivers,
            requests,
            push,
            config,
        }
    }

    /// Entry point for the "request created" trigger.
    ///
    /// Unexpected errors are logged and absorbed so the triggering
    /// platform does not retry indefinitely.
    pub async fn handle_request_created(&self, request: &RideRequest) {
        if request.status != RequestStatus::Searching {
            debug!(
                request_id = %request.id,
                status = ?request.status,
                "created request is not searching, ignoring"
            );
            return;
        }

        if let Err(e) = self.run_cycle(request).await {
            error!(request_id = %request.id, error = %e, "search cycle failed");
        }
    }

    /// Entry point for the "request updated" trigger (refresh signal).
    ///
    /// Runs a new cycle only for a still-searching request whose
    /// `searchRefreshedAt` advanced strictly past the previous snapshot;
    /// duplicate or out-of-order stamps are no-ops.
    pub async fn handle_request_updated(&self, before: &RideRequest, after: &RideRequest) {
        if after.status != RequestStatus::Searching {
            debug!(
                request_id = %after.id,
                status = ?after.status,
                "updated request is not searching, ignoring"
            );
            return;
        }

        let Some(refreshed_at) = after.search_refreshed_at else {
            debug!(request_id = %after.id, "update carries no refresh stamp, ignoring");
            return;
        };
        if let Some(previous) = before.search_refreshed_at {
            if refreshed_at <= previous {
                debug!(
                    request_id = %after.id,
                    %refreshed_at,
                    %previous,
                    "stale or duplicate refresh stamp, ignoring"
                );
                return;
            }
        }

        info!(request_id = %after.id, attempt = after.search_attempts + 1, "search refreshed");
        if let Err(e) = self.run_cycle(after).await {
            error!(request_id = %after.id, error = %e, "refresh cycle failed");
        }
    }

    /// One search cycle: fetch -> select -> score -> persist -> notify,
    /// strictly in that order. The status write happens before the
    /// delivery attempt so a concurrent refresh observes `DriverNotified`
    /// and is rejected by the guard above.
    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    pub async fn run_cycle(&self, request: &RideRequest) -> Result<()> {
        let available = self
            .drivers
            .available_drivers()
            .await
            .context("driver registry read failed")?;

        let distances = select_candidates(
            request.pickup.location,
            self.config.search_radius_km,
            &available,
        );
        let ranked = rank_candidates(&available, &distances, &self.config.weights);

        let Some(top) = ranked.first() else {
            info!(
                radius_km = self.config.search_radius_km,
                drivers_considered = available.len(),
                "no candidates within radius"
            );
            return self
                .requests
                .mark_no_drivers(&request.id)
                .await
                .context("failed to flag no-drivers cycle");
        };

        let notified = NotifiedDriver {
            driver_id: top.driver_id.clone(),
            tier: top.tier,
            priority_score: top.score,
            notification_time: Utc::now(),
        };
        let nearby: Vec<NearbyDriverSummary> = ranked
            .iter()
            .map(|c| NearbyDriverSummary {
                driver_id: c.driver_id.clone(),
                distance_km: c.distance_km,
                tier: c.tier,
                priority_score: c.score,
                acceptance_rate: c.acceptance_rate,
            })
            .collect();

        let won = self
            .requests
            .try_mark_notified(&request.id, notified, nearby)
            .await
            .context("failed to persist notified driver")?;
        if !won {
            info!(
                driver_id = %top.driver_id,
                "request moved past searching concurrently, notification skipped"
            );
            return Ok(());
        }

        info!(
            driver_id = %top.driver_id,
            score = top.score,
            tier = %top.tier,
            distance_km = top.distance_km,
            candidates = ranked.len(),
            "driver notified"
        );

        // Delivery failures never roll back the transition; the
        // collaborator timeout flow recovers from a lost notification.
        self.deliver_offer(request, top, &available).await;

        Ok(())
    }

    async fn deliver_offer(
        &self,
        request: &RideRequest,
        top: &ScoredCandidate,
        available: &[Driver],
    ) {
        let Some(token) = available
            .iter()
            .find(|d| d.id == top.driver_id)
            .and_then(|d| d.push_token.as_deref())
        else {
            warn!(driver_id = %top.driver_id, "notified driver has no push token, delivery skipped");
            return;
        };

        let dropped = RideOfferPayload::truncated_stops(request);
        if dropped > 0 {
            warn!(
                request_id = %request.id,
                dropped,
                "stop list exceeds payload cap, truncated"
            );
        }

        let payload =
            RideOfferPayload::from_request(request, self.config.response_expiry_seconds);
        let data = match serde_json::to_value(&payload) {
            Ok(data) => data,
            Err(e) => {
                error!(request_id = %request.id, error = %e, "offer payload serialization failed");
                return;
            }
        };

        let message = PushMessage {
            title: "New ride request".to_string(),
            body: format!(
                "Pickup at {} · {:.1} km · est. fare {:.2}",
                request.pickup.address, request.distance_km, request.fare_estimate
            ),
            data,
        };

        if let Err(e) = self.push.send(token, &message).await {
            error!(
                request_id = %request.id,
                driver_id = %top.driver_id,
                error = %e,
                "push delivery failed"
            );
        }
    }
}
