//! End-to-end search cycles against the in-memory stores.

use std::sync::Arc;

use chrono::{Duration, Utc};
use ride_dispatch::config::DispatchConfig;
use ride_dispatch::dispatch::DispatchEngine;
use ride_dispatch::models::{Driver, GeoPoint, Place, RequestStatus, RideRequest, Stop};
use ride_dispatch::push::RecordingPushSender;
use ride_dispatch::reliability::{
    DriverMetrics, ReliabilityTracker, RideOutcome, Tier, TierPolicy,
};
use ride_dispatch::store::{InMemoryDriverStore, InMemoryRequestStore, RideRequestRepository};

const PICKUP: GeoPoint = GeoPoint {
    latitude: 42.3600,
    longitude: -71.0600,
};

// ~1 km of latitude in degrees.
const KM_LAT: f64 = 0.008993;

fn driver_at(id: &str, km_north: f64, rating: f64, metrics: DriverMetrics) -> Driver {
    Driver {
        id: id.to_string(),
        display_name: Some(format!("Driver {id}")),
        is_online: true,
        is_available: true,
        location: Some(GeoPoint {
            latitude: PICKUP.latitude + km_north * KM_LAT,
            longitude: PICKUP.longitude,
        }),
        rating,
        push_token: Some(format!("token-{id}")),
        metrics,
    }
}

fn metrics_with_history(accepted: u32, rejected: u32, policy: &TierPolicy) -> DriverMetrics {
    let now = Utc::now();
    let mut m = DriverMetrics::default();
    for _ in 0..accepted {
        m.observe(RideOutcome::Accepted, now, policy);
    }
    for _ in 0..rejected {
        m.observe(RideOutcome::Rejected, now, policy);
    }
    m
}

fn searching_request(id: &str, stops: Vec<Stop>) -> RideRequest {
    RideRequest {
        id: id.to_string(),
        status: RequestStatus::Searching,
        pickup: Place {
            address: "12 Beacon St".to_string(),
            location: PICKUP,
        },
        dropoff: Place {
            address: "800 Boylston St".to_string(),
            location: GeoPoint {
                latitude: 42.3478,
                longitude: -71.0822,
            },
        },
        stops,
        fare_estimate: 21.5,
        distance_km: 4.2,
        duration_minutes: 16.0,
        notified_driver_id: None,
        notified_driver_tier: None,
        notified_driver_priority: None,
        notification_time: None,
        search_refreshed_at: None,
        search_attempts: 0,
        no_drivers_available: false,
        nearby_drivers: vec![],
    }
}

struct Harness {
    drivers: Arc<InMemoryDriverStore>,
    requests: Arc<InMemoryRequestStore>,
    push: Arc<RecordingPushSender>,
    engine: Arc<DispatchEngine>,
}

fn harness() -> Harness {
    let drivers = Arc::new(InMemoryDriverStore::new());
    let requests = Arc::new(InMemoryRequestStore::new());
    let push = Arc::new(RecordingPushSender::new());
    let engine = Arc::new(DispatchEngine::new(
        drivers.clone(),
        requests.clone(),
        push.clone(),
        DispatchConfig::default(),
    ));
    Harness {
        drivers,
        requests,
        push,
        engine,
    }
}

#[tokio::test]
async fn reliable_far_driver_outranks_close_unreliable_one() {
    let h = harness();
    let policy = TierPolicy::default();

    // ~2 km away, platinum-grade history, 4.5 stars.
    h.drivers
        .insert(driver_at("reliable", 2.0, 4.5, metrics_with_history(28, 2, &policy)))
        .await;
    // ~1 km away, coin-flip history, 3 stars.
    h.drivers
        .insert(driver_at("flaky", 1.0, 3.0, metrics_with_history(5, 5, &policy)))
        .await;

    let request = searching_request("r1", vec![]);
    h.requests.insert(request.clone()).await;
    h.engine.handle_request_created(&request).await;

    let stored = h.requests.get("r1").await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::DriverNotified);
    assert_eq!(stored.notified_driver_id.as_deref(), Some("reliable"));
    assert_eq!(stored.notified_driver_tier, Some(Tier::Platinum));
    assert!(stored.notification_time.is_some());

    // The ranked summaries land on the document, best first, and the
    // notified driver is the top entry.
    assert_eq!(stored.nearby_drivers.len(), 2);
    assert_eq!(stored.nearby_drivers[0].driver_id, "reliable");
    assert!(stored.nearby_drivers[0].priority_score > stored.nearby_drivers[1].priority_score);
    assert_eq!(
        stored.notified_driver_priority,
        Some(stored.nearby_drivers[0].priority_score)
    );

    // One delivery, to the winner's token, carrying the structured offer.
    let sent = h.push.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "token-reliable");
    assert_eq!(sent[0].1.data["requestId"], "r1");
    assert_eq!(sent[0].1.data["schemaVersion"], 1);
}

#[tokio::test]
async fn no_candidates_flags_request_without_notification() {
    let h = harness();
    // ~12 km away: outside the 5 km default radius.
    h.drivers
        .insert(driver_at("far", 12.0, 5.0, DriverMetrics::default()))
        .await;

    let request = searching_request("r1", vec![]);
    h.requests.insert(request.clone()).await;
    h.engine.handle_request_created(&request).await;

    let stored = h.requests.get("r1").await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Searching);
    assert!(stored.no_drivers_available);
    assert!(stored.notified_driver_id.is_none());
    assert_eq!(stored.search_attempts, 1);
    assert!(h.push.sent().await.is_empty());
}

#[tokio::test]
async fn refresh_after_no_drivers_retries_with_current_state() {
    let h = harness();
    let request = searching_request("r1", vec![]);
    h.requests.insert(request.clone()).await;

    // First cycle: empty registry.
    h.engine.handle_request_created(&request).await;
    assert!(h.requests.get("r1").await.unwrap().unwrap().no_drivers_available);

    // A driver comes online, then the refresh signal fires.
    h.drivers
        .insert(driver_at("d1", 1.5, 4.2, DriverMetrics::default()))
        .await;
    let before = h.requests.get("r1").await.unwrap().unwrap();
    let mut after = before.clone();
    after.search_refreshed_at = Some(Utc::now());
    h.requests.insert(after.clone()).await;

    h.engine.handle_request_updated(&before, &after).await;

    let stored = h.requests.get("r1").await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::DriverNotified);
    assert_eq!(stored.notified_driver_id.as_deref(), Some("d1"));
    assert!(!stored.no_drivers_available);
    assert_eq!(stored.search_attempts, 2);
    assert_eq!(h.push.sent().await.len(), 1);
}

#[tokio::test]
async fn duplicate_refresh_stamp_does_not_rerun_search() {
    let h = harness();
    h.drivers
        .insert(driver_at("d1", 1.0, 4.0, DriverMetrics::default()))
        .await;

    let stamp = Utc::now();
    let mut request = searching_request("r1", vec![]);
    request.search_refreshed_at = Some(stamp);
    h.requests.insert(request.clone()).await;

    // Same stamp in before and after: must be a no-op.
    h.engine.handle_request_updated(&request, &request).await;
    assert!(h.push.sent().await.is_empty());

    // Older stamp on the update: also a no-op.
    let mut stale = request.clone();
    stale.search_refreshed_at = Some(stamp - Duration::seconds(10));
    h.engine.handle_request_updated(&request, &stale).await;
    assert!(h.push.sent().await.is_empty());
}

#[tokio::test]
async fn concurrent_cycles_notify_exactly_once() {
    let h = harness();
    h.drivers
        .insert(driver_at("d1", 1.0, 4.0, DriverMetrics::default()))
        .await;
    let request = searching_request("r1", vec![]);
    h.requests.insert(request.clone()).await;

    // A near-simultaneous create + refresh race for the same request.
    let created = {
        let engine = h.engine.clone();
        let request = request.clone();
        tokio::spawn(async move { engine.handle_request_created(&request).await })
    };
    let refreshed = {
        let engine = h.engine.clone();
        let before = request.clone();
        let mut after = request.clone();
        after.search_refreshed_at = Some(Utc::now());
        tokio::spawn(async move { engine.handle_request_updated(&before, &after).await })
    };
    created.await.unwrap();
    refreshed.await.unwrap();

    let stored = h.requests.get("r1").await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::DriverNotified);
    assert_eq!(h.push.sent().await.len(), 1, "double-notify");
}

#[tokio::test]
async fn offer_payload_truncates_stops_but_keeps_total_waiting() {
    let h = harness();
    h.drivers
        .insert(driver_at("d1", 1.0, 4.0, DriverMetrics::default()))
        .await;

    let stops: Vec<Stop> = (0..7)
        .map(|i| Stop {
            address: format!("stop {i}"),
            location: GeoPoint {
                latitude: PICKUP.latitude + 0.001 * i as f64,
                longitude: PICKUP.longitude,
            },
            waiting_minutes: 3,
        })
        .collect();
    let request = searching_request("r1", stops);
    h.requests.insert(request.clone()).await;

    h.engine.handle_request_created(&request).await;

    let sent = h.push.sent().await;
    assert_eq!(sent.len(), 1);
    let data = &sent[0].1.data;
    assert_eq!(data["stops"].as_array().unwrap().len(), 5);
    assert_eq!(data["totalWaitingMinutes"], 21);
}

#[tokio::test]
async fn observed_outcomes_feed_back_into_ranking() {
    let h = harness();
    let policy = TierPolicy::default();
    h.drivers
        .insert(driver_at("a", 1.0, 4.0, DriverMetrics::default()))
        .await;
    h.drivers
        .insert(driver_at("b", 1.0, 4.0, DriverMetrics::default()))
        .await;

    // Driver b builds a strong acceptance history through the tracker.
    let tracker = ReliabilityTracker::new(h.drivers.clone(), policy);
    for _ in 0..12 {
        tracker.observe("b", RideOutcome::Accepted).await.unwrap();
    }

    let request = searching_request("r1", vec![]);
    h.requests.insert(request.clone()).await;
    h.engine.handle_request_created(&request).await;

    let stored = h.requests.get("r1").await.unwrap().unwrap();
    assert_eq!(stored.notified_driver_id.as_deref(), Some("b"));
    assert_eq!(stored.notified_driver_tier, Some(Tier::Gold));
}
