//! Integration tests for the scan API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The location client is a scripted
//! `StubScanClient`, so every scan is deterministic.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use spawnscan_core::{Credentials, ScanError, Scanner, StubScanClient};
use spawnscan_server::build_router;
use spawnscan_server::state::AppState;
use spawnscan_types::{
    Coordinate, LandmarkDetails, RawCellBatch, RawLandmark, RawSighting, SpawnPointId,
};
use tower::ServiceExt;

const SCAN_URI: &str = "/?id=5&lat=45.2156&lng=2.4586&rad=4";

fn make_state(client: StubScanClient) -> Arc<AppState<StubScanClient>> {
    let scanner = Scanner::new(client, Credentials::default(), 15).unwrap();
    Arc::new(AppState::new(scanner))
}

fn abra_and_gym() -> RawCellBatch {
    RawCellBatch::single(
        vec![RawSighting {
            spawn_point_id: SpawnPointId::new("89c25"),
            entity_id: 63,
            position: Coordinate::new(45.2157, 2.4587),
            time_till_hidden_ms: 60_000,
        }],
        vec![RawLandmark {
            enabled: true,
            position: Coordinate::new(45.2150, 2.4580),
            details: LandmarkDetails::Gym {
                team: 2,
                score: 1800,
            },
        }],
    )
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_scan_returns_sightings_and_landmarks() {
    let state = make_state(StubScanClient::with_script([Ok(abra_and_gym())]));
    let router = build_router(Arc::clone(&state));

    let before = Utc::now().timestamp();
    let response = router
        .oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let after = Utc::now().timestamp();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], 5);

    let pokemons = json["pokemons"].as_array().unwrap();
    assert_eq!(pokemons.len(), 1);
    assert_eq!(pokemons[0]["id"], 63);
    assert_eq!(pokemons[0]["hash"], "89c25:63");
    let disappear = pokemons[0]["disappear_time"].as_i64().unwrap();
    assert!(disappear >= before + 60 && disappear <= after + 60);

    let gyms = json["gyms"].as_array().unwrap();
    assert_eq!(gyms.len(), 1);
    assert_eq!(gyms[0]["team"], 2);
    assert_eq!(gyms[0]["score"], 1800);
    assert!(json["pokestops"].as_array().unwrap().is_empty());

    // Center heartbeat plus four children, no retry.
    assert_eq!(state.scanner.client().heartbeat_count(), 5);
    assert_eq!(state.scanner.client().login_count(), 1);
}

#[tokio::test]
async fn test_missing_field_is_expectation_failed() {
    let state = make_state(StubScanClient::new());
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::get("/?id=5&lat=45.2156&lng=2.4586")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    let text = body_to_text(response.into_body()).await;
    assert!(text.contains("rad"));
    assert_eq!(state.scanner.client().heartbeat_count(), 0);
    assert_eq!(state.scanner.client().login_count(), 0);
}

#[tokio::test]
async fn test_malformed_field_is_expectation_failed() {
    let state = make_state(StubScanClient::new());
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::get("/?id=5&lat=north&lng=2.4586&rad=4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    assert_eq!(state.scanner.client().heartbeat_count(), 0);
}

#[tokio::test]
async fn test_zero_sightings_retries_once_with_fresh_session() {
    let state = make_state(StubScanClient::new());
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["pokemons"].as_array().unwrap().is_empty());

    assert_eq!(state.scanner.client().heartbeat_count(), 10);
    assert_eq!(state.scanner.client().login_count(), 2);
}

#[tokio::test]
async fn test_repeated_field_uses_first_value() {
    let state = make_state(StubScanClient::with_script([Ok(abra_and_gym())]));
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::get("/?id=1&id=2&lat=45.2156&lng=2.4586&rad=4&rad=x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], 1);
}

#[tokio::test]
async fn test_retry_drops_offsets() {
    let state = make_state(StubScanClient::new());
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::get("/?id=1&lat=45.2156&lng=2.4586&rad=4&x=1&y=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let visited = state.scanner.client().visited();
    let base = Coordinate::new(45.2156, 2.4586);
    assert_ne!(visited[0], base);
    // The retry starts at the untranslated center.
    assert_eq!(visited[6], base);
    assert_eq!(*visited.last().unwrap(), base);
}

#[tokio::test]
async fn test_offsets_near_antimeridian_and_pole_are_scanned() {
    for uri in [
        "/?id=1&lat=-17.7&lng=179.999&rad=4&y=1&x=0",
        "/?id=1&lat=89.999&lng=0&rad=4&x=1&y=0",
    ] {
        let state = make_state(StubScanClient::with_script([Ok(abra_and_gym())]));
        let router = build_router(Arc::clone(&state));

        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let visited = state.scanner.client().visited();
        assert!(visited.iter().all(Coordinate::is_valid), "{uri}");
    }
}

#[tokio::test]
async fn test_authentication_failure_is_server_error() {
    let state = make_state(StubScanClient::rejecting_login());
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = body_to_text(response.into_body()).await;
    assert!(text.contains("authentication failed"));
    assert!(!state.session.lock().await.is_active());
}

#[tokio::test]
async fn test_partial_scan_is_returned() {
    let state = make_state(StubScanClient::with_script([
        Ok(abra_and_gym()),
        Err(ScanError::Transient(String::from("connection reset"))),
    ]));
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["pokemons"].as_array().unwrap().len(), 1);
    assert_eq!(state.scanner.client().heartbeat_count(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_session() {
    let state = make_state(StubScanClient::repeating(abra_and_gym()));
    let router = build_router(Arc::clone(&state));

    let (first, second) = tokio::join!(
        router
            .clone()
            .oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap()),
        router.oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap()),
    );

    assert_eq!(first.unwrap().status(), StatusCode::OK);
    assert_eq!(second.unwrap().status(), StatusCode::OK);
    assert_eq!(state.scanner.client().login_count(), 1);
    assert_eq!(state.scanner.client().heartbeat_count(), 10);
}

#[tokio::test]
async fn test_post_acknowledges_and_requests_restart() {
    let state = make_state(StubScanClient::new());
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::post("/")
                .body(Body::from("anything"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"dump": "ok"}));
    assert!(state.restart.is_requested());
}

#[tokio::test]
async fn test_scan_publishes_sightings() {
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let scanner = Scanner::new(
        StubScanClient::with_script([Ok(abra_and_gym())]),
        Credentials::default(),
        15,
    )
    .unwrap();
    let state = Arc::new(AppState::new(scanner).with_notifications(sender));
    let router = build_router(state);

    let response = router
        .oneshot(Request::get(SCAN_URI).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let published = receiver.recv().await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].hash, "89c25:63");
}
