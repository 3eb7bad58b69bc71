use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::fetcher::testing::MockTransport;
use crate::providers::fixtures;
use crate::{api, config::Config, state::AppState};

const CENTRE: &str = "lat=58.15&lon=8.0";

fn healthy_upstreams() -> MockTransport {
    MockTransport::new()
        .respond("locationforecast", 200, fixtures::LOCATIONFORECAST)
        .respond("airqualityforecast", 200, fixtures::AIRQUALITY_POOR)
        .respond("hoydedata", 200, fixtures::ELEVATION)
}

fn failing_upstreams() -> MockTransport {
    MockTransport::new()
        .statuses("locationforecast", &[503])
        .statuses("airqualityforecast", &[503])
        .statuses("hoydedata", &[503])
}

fn setup_app(
    config: Config,
    transport: MockTransport,
) -> (axum::Router, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    let state = Arc::new(AppState::with_transport(config.clone(), transport.clone()));
    (api::routes(&config).with_state(state), transport)
}

fn get(uri: &str, client: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Forwarded-For", client)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_reports_version() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let res = app.oneshot(get("/health", "198.51.100.1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()["x-ratelimit-remaining"], "59");

    let body = read_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn request_id_is_echoed() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let req = Request::builder()
        .uri("/sources")
        .header("x-request-id", "trace-me-42")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "trace-me-42");

    let body = read_json(res).await;
    assert_eq!(body["sources"].as_array().unwrap().len(), 4);
    assert_eq!(body["sources"][0]["type"], "Climate");
}

#[tokio::test]
async fn climate_returns_real_reading() {
    let (app, transport) = setup_app(Config::default(), healthy_upstreams());

    let res = app
        .oneshot(get(&format!("/v1/klima?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["temperatureC"], json!(11.4));
    assert_eq!(body["windSpeedMps"], json!(5.2));
    assert_eq!(body["precipitationMm"], json!(0.6));
    assert_eq!(body["source"], "met");
    assert_eq!(transport.calls_matching("locationforecast"), 1);
}

#[tokio::test]
async fn out_of_bounds_coordinates_are_rejected() {
    let (app, transport) = setup_app(Config::default(), healthy_upstreams());

    for path in ["/v1/klima", "/v1/forurensing", "/v1/hoyde", "/v1/energi", "/v1/sammendrag"] {
        let res = app
            .clone()
            .oneshot(get(&format!("{path}?lat=59.99&lon=10.75"), "198.51.100.1"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        let body = read_json(res).await;
        assert!(
            body["error"].as_str().unwrap().contains("out of bounds"),
            "{path}: {body}"
        );
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn missing_and_garbage_coordinates() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let res = app
        .clone()
        .oneshot(get("/v1/hoyde?lat=58.15", "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"], "Invalid coordinates");

    let res = app
        .oneshot(get("/v1/hoyde?lat=abc&lon=8.0", "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"], "Invalid coordinates: NaN");
}

#[tokio::test(start_paused = true)]
async fn climate_outage_is_service_unavailable() {
    let (app, transport) = setup_app(Config::default(), failing_upstreams());

    let res = app
        .oneshot(get(&format!("/v1/klima?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(res).await;
    assert_eq!(body["error"], "Climate data unavailable");
    assert_eq!(body["availability"], false);
    // One retry, then give up.
    assert_eq!(transport.calls_matching("locationforecast"), 2);
}

#[tokio::test(start_paused = true)]
async fn pollution_and_elevation_fall_back_to_mock() {
    let (app, _) = setup_app(Config::default(), failing_upstreams());

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/forurensing?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["source"], "mock");
    assert_eq!(body["confidence"], "low (mock)");
    assert_eq!(body["pm2_5"], json!(8.2));

    let res = app
        .oneshot(get(&format!("/v1/hoyde?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["source"], "mock");
    assert!(body["elevationMeters"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn energy_is_always_mock() {
    let (app, transport) = setup_app(Config::default(), healthy_upstreams());

    let res = app
        .oneshot(get(&format!("/v1/energi?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["source"], "mock");
    assert_eq!(body["note"], "Mock provider in MVP");
    assert!(body["energyContext"]["gridLoadEstimate"]
        .as_str()
        .unwrap()
        .ends_with('%'));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn summary_combines_all_providers() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let res = app
        .oneshot(get(&format!("/v1/sammendrag?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["location"]["withinBounds"], true);
    assert_eq!(body["klima"]["source"], "met");
    assert_eq!(body["forurensing"]["airQualityIndex"], 3);
    assert_eq!(body["hoyde"]["elevationMeters"], json!(37.4));
    assert_eq!(body["energi"]["source"], "mock");
    assert_eq!(body["meta"]["sourcesUsed"], json!(["met", "kartverket", "mock"]));
    assert!(body["meta"]["generatedAt"].is_string());
}

#[tokio::test(start_paused = true)]
async fn summary_survives_total_outage() {
    let (app, _) = setup_app(Config::default(), failing_upstreams());

    let res = app
        .oneshot(get(&format!("/v1/sammendrag?{CENTRE}"), "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert!(body["klima"].is_null());
    assert_eq!(body["forurensing"]["source"], "mock");
    assert_eq!(body["hoyde"]["source"], "mock");
    assert_eq!(body["meta"]["sourcesUsed"], json!(["mock"]));
}

#[tokio::test]
async fn repeated_summaries_hit_upstreams_once() {
    let (app, transport) = setup_app(Config::default(), healthy_upstreams());

    let first = read_json(
        app.clone()
            .oneshot(get(&format!("/v1/sammendrag?{CENTRE}"), "198.51.100.1"))
            .await
            .unwrap(),
    )
    .await;
    let second = read_json(
        app.oneshot(get(&format!("/v1/sammendrag?{CENTRE}"), "198.51.100.1"))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first["klima"], second["klima"]);
    assert_eq!(first["hoyde"], second["hoyde"]);
    assert_eq!(transport.calls_matching("locationforecast"), 1);
    assert_eq!(transport.calls_matching("airqualityforecast"), 1);
    assert_eq!(transport.calls_matching("hoydedata"), 1);
}

#[tokio::test]
async fn grid_defaults_to_25_points_row_major() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let uri = "/v1/grid?minLat=58.10&maxLat=58.20&minLon=7.90&maxLon=8.10";
    let res = app.oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 25);
    assert_eq!(points[0]["id"], "p-0");
    assert_eq!(points[0]["lat"], json!(58.10));
    assert_eq!(points[0]["lon"], json!(7.90));
    assert_eq!(points[24]["id"], "p-24");
    assert_eq!(points[24]["klima"]["source"], "met");
}

#[tokio::test]
async fn grid_clamps_point_count() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let uri = "/v1/grid?minLat=58.10&maxLat=58.20&minLon=7.90&maxLon=8.10&points=41";
    let body = read_json(app.oneshot(get(uri, "198.51.100.1")).await.unwrap()).await;
    assert_eq!(body.as_array().unwrap().len(), 40);
}

#[tokio::test]
async fn grid_rate_limit_is_per_client() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());
    let uri = "/v1/grid?minLat=58.10&maxLat=58.20&minLon=7.90&maxLon=8.10&points=4";

    let first = app.clone().oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

    let second = app.clone().oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        read_json(second).await["error"],
        "Grid rate limit exceeded (1 req / 2 min)"
    );

    let other = app.oneshot(get(uri, "198.51.100.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn grid_limit_applies_before_parameter_parsing() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let res = app
        .clone()
        .oneshot(get("/v1/grid?minLat=oops", "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"], "Invalid parameters");

    // The malformed request still consumed the client's grid allowance.
    let uri = "/v1/grid?minLat=58.10&maxLat=58.20&minLon=7.90&maxLon=8.10";
    let res = app.oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn grid_corner_outside_area_is_rejected() {
    let (app, transport) = setup_app(Config::default(), healthy_upstreams());

    let uri = "/v1/grid?minLat=58.10&maxLat=59.90&minLon=7.90&maxLon=8.10";
    let res = app.oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error = read_json(res).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Grid bounds outside allowed area: "), "{error}");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn global_limit_covers_every_route() {
    let config = Config {
        global_rate_limit: 2,
        ..Config::default()
    };
    let (app, _) = setup_app(config, healthy_upstreams());

    for _ in 0..2 {
        let res = app.clone().oneshot(get("/health", "198.51.100.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app
        .clone()
        .oneshot(get("/sources", "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(read_json(res).await["error"], "Too Many Requests");

    let res = app.oneshot(get("/health", "198.51.100.3")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_rate_limiting_lets_everything_through() {
    let config = Config {
        rate_limit_enabled: false,
        global_rate_limit: 1,
        ..Config::default()
    };
    let (app, _) = setup_app(config, healthy_upstreams());

    for _ in 0..5 {
        let res = app.clone().oneshot(get("/health", "198.51.100.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.headers().contains_key("x-ratelimit-remaining"));
    }
}

#[tokio::test]
async fn undecodable_point_query_is_json_400() {
    let (app, transport) = setup_app(Config::default(), healthy_upstreams());

    for path in ["/v1/energi", "/v1/klima", "/v1/sammendrag"] {
        let res = app
            .clone()
            .oneshot(get(&format!("{path}?lat=58.15&lat=58.16&lon=8.0"), "198.51.100.1"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(read_json(res).await["error"], "Invalid coordinates");
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn undecodable_grid_query_is_json_400() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let uri = "/v1/grid?minLat=58.10&minLat=58.11&maxLat=58.20&minLon=7.90&maxLon=8.10";
    let res = app.oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(read_json(res).await["error"], "Invalid parameters");
}

#[tokio::test]
async fn fractional_grid_count_keeps_its_layout() {
    let (app, _) = setup_app(Config::default(), healthy_upstreams());

    let uri = "/v1/grid?minLat=58.10&maxLat=58.20&minLon=7.90&maxLon=8.10&points=8.5";
    let res = app.oneshot(get(uri, "198.51.100.1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 9);

    // Two rows of five columns, the second row cut short.
    let first_row = points.iter().filter(|p| p["lat"] == json!(58.10)).count();
    assert_eq!(first_row, 5);
    let lon = points[1]["lon"].as_f64().unwrap();
    assert!((lon - 7.95).abs() < 1e-9, "{lon}");
    let lat = points[8]["lat"].as_f64().unwrap();
    assert!((lat - 58.20).abs() < 1e-9, "{lat}");
}
