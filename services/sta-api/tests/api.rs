//! HTTP round trips against the router with an in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sta_api::build_router;
use sta_api::config::ServerConfig;
use sta_api::state::AppState;
use test_utils::{datastream, location, observation, observed_property, sensor, thing, with};

fn app() -> Router {
    let config = ServerConfig {
        base_url: "http://test/v1.1".to_string(),
        ..ServerConfig::default()
    };
    build_router(Arc::new(AppState::in_memory(config)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, value)
}

async fn create(app: &Router, path: &str, body: Value) -> String {
    let (status, _, value) = send(app, Method::POST, path, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", path, value);
    value["@iot.id"].as_str().unwrap().to_string()
}

/// A Datastream on a Thing at a Location, returning (thing, datastream).
async fn station(app: &Router) -> (String, String) {
    let body = datastream(
        "air temperature",
        with(thing("station"), "Locations", json!([location("home", 7.0, 51.0)])),
        sensor("thermometer"),
        observed_property("temperature"),
    );
    let ds = create(app, "/v1.1/Datastreams", body).await;
    let (_, _, thing) = send(app, Method::GET, &format!("/v1.1/Datastreams('{}')/Thing", ds), None).await;
    (thing["@iot.id"].as_str().unwrap().to_string(), ds)
}

#[tokio::test]
async fn test_health_and_landing() {
    let app = app();
    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&app, Method::GET, "/v1.1", None).await;
    let names: Vec<&str> = body["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|set| set["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"FeaturesOfInterest"));
}

#[tokio::test]
async fn test_create_returns_location_header() {
    let app = app();
    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/v1.1/Things",
        Some(with(thing("station"), "@iot.id", json!(1))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers[header::LOCATION], "http://test/v1.1/Things(1)");
    assert_eq!(body["@iot.selfLink"], "http://test/v1.1/Things(1)");
    assert_eq!(
        body["Datastreams@iot.navigationLink"],
        "http://test/v1.1/Things(1)/Datastreams"
    );

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/v1.1/Things",
        Some(with(thing("again"), "@iot.id", json!(1))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_deep_insert_and_navigation() {
    let app = app();
    let (thing, ds) = station(&app).await;

    let (status, _, body) = send(
        &app,
        Method::GET,
        &format!("/v1.1/Things('{}')/Locations", thing),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"].as_array().unwrap().len(), 1);
    assert_eq!(body["value"][0]["name"], "home");

    let (_, _, body) = send(
        &app,
        Method::GET,
        &format!("/v1.1/Things('{}')/HistoricalLocations", thing),
        None,
    )
    .await;
    assert_eq!(body["value"].as_array().unwrap().len(), 1);

    let (_, _, body) = send(&app, Method::GET, &format!("/v1.1/Datastreams('{}')", ds), None).await;
    assert_eq!(body["unitOfMeasurement"]["symbol"], "degC");
    assert!(body.get("phenomenonTime").is_none());
}

#[tokio::test]
async fn test_observations_through_datastream() {
    let app = app();
    let (_, ds) = station(&app).await;
    let path = format!("/v1.1/Datastreams('{}')/Observations", ds);

    for (time, result) in [("2023-01-01T00:00:00Z", 20.5), ("2023-01-01T01:00:00Z", 21.0)] {
        create(&app, &path, json!({ "phenomenonTime": time, "result": result })).await;
    }

    let uri = format!("{}?$count=true&$top=1&$orderby=phenomenonTime%20desc", path);
    let (status, _, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["@iot.count"], 2);
    assert_eq!(body["value"][0]["result"], 21.0);
    assert!(body["@iot.nextLink"].as_str().unwrap().contains("$skip=1"));

    let obs = body["value"][0]["@iot.id"].as_str().unwrap().to_string();
    let (status, _, feature) = send(
        &app,
        Method::GET,
        &format!("/v1.1/Observations('{}')/FeatureOfInterest", obs),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feature["feature"]["coordinates"], json!([7.0, 51.0]));

    let (_, _, body) = send(&app, Method::GET, &format!("/v1.1/Datastreams('{}')", ds), None).await;
    assert_eq!(
        body["phenomenonTime"],
        "2023-01-01T00:00:00Z/2023-01-01T01:00:00Z"
    );
}

#[tokio::test]
async fn test_invalid_create_is_rejected_whole() {
    let app = app();
    let body = json!({
        "name": "orphan",
        "description": "no thing",
        "observationType": test_utils::observation_type::MEASUREMENT,
        "unitOfMeasurement": test_utils::unit("degC"),
        "Sensor": sensor("s"),
        "ObservedProperty": observed_property("p")
    });
    let (status, _, error) = send(&app, Method::POST, "/v1.1/Datastreams", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 400);

    for set in ["Datastreams", "Sensors", "ObservedProperties"] {
        let (_, _, body) = send(&app, Method::GET, &format!("/v1.1/{}", set), None).await;
        assert!(body["value"].as_array().unwrap().is_empty(), "{} not empty", set);
    }
}

#[tokio::test]
async fn test_patch_put_and_delete() {
    let app = app();
    let (thing, ds) = station(&app).await;
    let thing_path = format!("/v1.1/Things('{}')", thing);

    let (status, _, body) = send(&app, Method::PATCH, &thing_path, Some(json!({ "name": "renamed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");

    let (status, _, _) = send(
        &app,
        Method::PATCH,
        &thing_path,
        Some(json!({ "Locations": [location("elsewhere", 1.0, 2.0)] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, Method::PUT, &thing_path, Some(test_utils::thing("x"))).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    let (status, _, _) = send(&app, Method::PUT, "/v1.1/Things('nope')", Some(test_utils::thing("x"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    create(
        &app,
        &format!("/v1.1/Datastreams('{}')/Observations", ds),
        observation(&ds, "2023-01-01T00:00:00Z", json!(1.0)),
    )
    .await;

    let (status, _, _) = send(&app, Method::DELETE, &thing_path, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, Method::GET, &thing_path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, _, body) = send(&app, Method::GET, "/v1.1/Observations", None).await;
    assert!(body["value"].as_array().unwrap().is_empty());
    let (_, _, body) = send(&app, Method::GET, "/v1.1/Sensors", None).await;
    assert_eq!(body["value"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_request_errors() {
    let app = app();

    let (status, _, _) = send(&app, Method::GET, "/v1.1/Things?$filter=name%20eq%20'x'", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let (status, _, _) = send(&app, Method::GET, "/v1.1/Gadgets", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, Method::GET, "/v1.1/Things?$top=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1.1/Things")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
