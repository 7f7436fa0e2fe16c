mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use common::service;
use housing_lens::market::housing_router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn cities_endpoint_lists_catalog() {
    let (service, _) = service();
    let app = housing_router(Arc::new(service));

    let response = app
        .oneshot(get("/api/v1/housing/cities"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["cities"][0], "Madrid");
    assert_eq!(body["housing_types"], json!(["new", "resale"]));
    assert_eq!(body["map_available"], false);
}

#[tokio::test]
async fn query_endpoint_returns_outcome_and_records_history() {
    let (service, _) = service();
    let app = housing_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/housing/query",
            json!({
                "age": 27,
                "annual_income": 12000,
                "city": "Teruel",
                "housing_type": "resale",
                "top": 2
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["guidance"], "affordable_first");
    assert_eq!(body["selected_affordability"]["viability_tier"], "moderate");
    assert!(body["recommendations"].as_array().expect("array").len() <= 2);

    let history = app
        .oneshot(get("/api/v1/housing/history"))
        .await
        .expect("response");
    let body = body_json(history).await;
    assert_eq!(body["entries"][0]["City"], "Teruel");
}

#[tokio::test]
async fn query_endpoint_rejects_unknown_city() {
    let (service, _) = service();
    let app = housing_router(Arc::new(service));

    let response = app
        .oneshot(post_json(
            "/api/v1/housing/query",
            json!({
                "age": 40,
                "annual_income": 50000,
                "city": "Gotham",
                "housing_type": "new"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().expect("message").contains("Gotham"));
}

#[tokio::test]
async fn affordability_endpoint_classifies_every_city() {
    let (service, _) = service();
    let app = housing_router(Arc::new(service));

    let response = app
        .oneshot(get(
            "/api/v1/housing/affordability?annual_income=60000&housing_type=new",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "city_markers");
    assert_eq!(body["regions"].as_array().expect("regions").len(), 4);
    assert_eq!(body["legend"].as_array().expect("legend").len(), 4);
}

#[tokio::test]
async fn records_endpoint_includes_rows_with_missing_prices() {
    let (service, _) = service();
    let app = housing_router(Arc::new(service));

    let response = app
        .oneshot(get("/api/v1/housing/records?city=Madrid"))
        .await
        .expect("response");
    let body = body_json(response).await;
    let records = body["records"].as_array().expect("records");
    assert_eq!(records.len(), 4);
    assert!(records
        .iter()
        .any(|record| record["price_per_sqm"].is_null()));
}
