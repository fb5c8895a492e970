mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{finished, fixture, harness, kickoff, FakeAdapter};
use serde_json::{json, Value};
use std::sync::Arc;
use tipster_api::create_app;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn nba_feed() -> Arc<FakeAdapter> {
    Arc::new(FakeAdapter::new(
        "feed",
        vec![
            fixture("1", "Lakers", "Celtics", kickoff(10, 0)),
            fixture("2", "Knicks", "Nets", kickoff(10, 2)),
        ],
    ))
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime"].as_str().unwrap().ends_with('s'));
}

#[tokio::test]
async fn test_leagues_endpoint() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    let (status, body) = send(&app, get("/api/v1/leagues")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "nba");
    assert_eq!(body["data"][0]["sport"], "basketball");
}

#[tokio::test]
async fn test_select_league_returns_matches_and_worker() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    let (status, body) = send(&app, post_json("/api/v1/select-league", json!({ "league_id": "NBA" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["league"], "nba");
    assert_eq!(data["provider"], "feed");
    assert_eq!(data["matches"].as_array().unwrap().len(), 2);
    assert_eq!(data["worker"]["games_collected"], 2);

    let first = &data["matches"][0];
    assert_eq!(first["match"]["home_team"], "Lakers");
    let confidence = first["consensus"]["confidence"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&confidence));
    assert!(["home", "away"].contains(&first["consensus"]["pick"].as_str().unwrap()));
}

#[tokio::test]
async fn test_unknown_league_is_no_data_not_error() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    let (status, body) = send(&app, post_json("/api/v1/select-league", json!({ "league_id": "curling" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "no_data");
    assert!(body["data"]["matches"].as_array().unwrap().is_empty());
    assert!(body["data"]["worker"].is_null());

    let (_, workers) = send(&app, get("/api/v1/workers")).await;
    assert!(workers["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_league_id_is_bad_request() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    let (status, body) = send(&app, post_json("/api/v1/select-league", json!({ "league_id": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_matches_served_from_cache() {
    let feed = nba_feed();
    let h = harness(vec![feed.clone()]);
    let app = create_app(h.state.clone());

    let (_, first) = send(&app, get("/api/v1/matches/nba")).await;
    let (_, second) = send(&app, get("/api/v1/matches/nba")).await;

    assert_eq!(first["data"]["from_cache"], false);
    assert_eq!(second["data"]["from_cache"], true);
    assert_eq!(second["data"]["matches"], first["data"]["matches"]);
    assert_eq!(feed.calls(), 1);
}

#[tokio::test]
async fn test_kill_all_clears_workers() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    send(&app, post_json("/api/v1/select-league", json!({ "league_id": "nba" }))).await;
    let (_, workers) = send(&app, get("/api/v1/workers")).await;
    assert_eq!(workers["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, post_json("/api/v1/kill-all", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["killed"], 1);

    let (_, workers) = send(&app, get("/api/v1/workers")).await;
    assert!(workers["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ledger_export_matches_file_on_disk() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    send(&app, post_json("/api/v1/select-league", json!({ "league_id": "nba" }))).await;
    let (status, body) = send(&app, get("/api/v1/ledger/nba")).await;

    assert_eq!(status, StatusCode::OK);
    let day = body["2030-03-10"].as_array().unwrap();
    assert_eq!(day.len(), 2);
    assert_eq!(day[0]["completed"], false);
    assert_eq!(day[0]["league"], "nba");

    let on_disk: Value =
        serde_json::from_slice(&std::fs::read(h.ledger_dir.path().join("nba.json")).unwrap()).unwrap();
    assert_eq!(on_disk, body);
}

#[tokio::test]
async fn test_ledger_rejects_unsafe_league_id() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    let (status, body) = send(&app, get("/api/v1/ledger/nba.backup")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_reconcile_and_accuracy() {
    let feed = nba_feed();
    let day = kickoff(10, 0);
    feed.set_results(
        day.date_naive(),
        vec![
            finished("1", "Lakers", "Celtics", day, (110, 100)),
            finished("2", "Knicks", "Nets", kickoff(10, 2), (90, 95)),
        ],
    );
    let h = harness(vec![feed]);
    let app = create_app(h.state.clone());

    send(&app, post_json("/api/v1/select-league", json!({ "league_id": "nba" }))).await;

    // Kickoff is in 2030, so nothing is due yet.
    let (status, body) = send(&app, post_json("/api/v1/reconcile", json!({ "league_id": "nba" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["examined"], 0);

    let report = h.reconciler.run(kickoff(11, 0)).await.unwrap();
    assert_eq!(report.graded, 2);

    let (status, body) = send(&app, get("/api/v1/accuracy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["overall"]["graded"], 2);
    assert_eq!(body["data"]["leagues"]["nba"]["pending"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let h = harness(vec![nba_feed()]);
    let app = create_app(h.state.clone());

    send(&app, post_json("/api/v1/select-league", json!({ "league_id": "nba" }))).await;
    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("tipster_resolutions_total"));
    assert!(text.contains("tipster_ledger_records_total{action=\"inserted\"} 2"));
}
