/// HTTP surface tests
///
/// The router is driven in-process with `tower::ServiceExt::oneshot` against
/// an artifact pair trained on a synthetic dataset.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::*;
use diabetes_risk::{
    api::{build_router, handlers::PredictionResponse, AppState},
    config::UiConfig,
    ml::PredictionService,
    models::RiskLabel,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup() -> (Router, TempDir) {
    let dir = temp_dir();
    let (artifacts, _, _) = train_into(dir.path(), 120);
    let service = PredictionService::load(&artifacts).unwrap();
    let state = AppState::new(Arc::new(service), UiConfig::default());
    (build_router(state), dir)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_body(values: [&str; 8]) -> String {
    let names = [
        "pregnancies",
        "glucose",
        "blood_pressure",
        "skin_thickness",
        "insulin",
        "bmi",
        "diabetes_pedigree",
        "age",
    ];
    names
        .iter()
        .zip(values)
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _dir) = setup();

    for path in ["/health", "/health/live", "/health/ready"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn test_index_renders_form() {
    let (app, _dir) = setup();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_string(response).await;
    assert!(page.contains("Smart Diabetes Risk Predictor"));
    assert!(page.contains(r#"action="/predict""#));
    assert!(page.contains("Plasma glucose concentration after 2 hours of oral test."));
    assert!(!page.contains("Risk Detected!"));
}

#[tokio::test]
async fn test_form_submit_renders_verdict() {
    let (app, _dir) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_body([
                    "2", "85", "66", "29", "0", "26.6", "0.35", "31",
                ])))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_string(response).await;
    assert!(page.contains("High Risk Detected!") ^ page.contains("Low Risk Detected!"));
    // submitted values are kept in the inputs
    assert!(page.contains(r#"value="26.6""#));
}

#[tokio::test]
async fn test_form_submit_with_invalid_age_shows_message() {
    let (app, _dir) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_body([
                    "2", "85", "66", "29", "0", "26.6", "0.35", "0",
                ])))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let page = body_string(response).await;
    assert!(page.contains("class=\"result invalid\""));
    assert!(!page.contains("Risk Detected!"));
}

#[tokio::test]
async fn test_json_prediction() {
    let (app, _dir) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/predictions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "pregnancies": 6.0,
                        "glucose": 170.0,
                        "blood_pressure": 72.0,
                        "skin_thickness": 35.0,
                        "insulin": 0.0,
                        "bmi": 36.0,
                        "diabetes_pedigree": 0.627,
                        "age": 50.0
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: PredictionResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.risk, body.label.class());
    assert_eq!(body.message, body.label.headline());
    assert!(body.confidence >= 0.5 && body.confidence <= 1.0);
    assert!(matches!(body.label, RiskLabel::Low | RiskLabel::High));
}

#[tokio::test]
async fn test_json_prediction_rejects_negative_values() {
    let (app, _dir) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/predictions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "pregnancies": 1.0,
                        "glucose": -5.0,
                        "blood_pressure": 72.0,
                        "skin_thickness": 35.0,
                        "insulin": 0.0,
                        "bmi": 30.0,
                        "diabetes_pedigree": 0.5,
                        "age": 40.0
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_model_info() {
    let (app, _dir) = setup();

    let response = app
        .oneshot(Request::builder().uri("/v1/model").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["artifacts"]["model"]["n_features"], 8);
    assert_eq!(body["artifacts"]["model"]["model_type"], "gradient_boosting");
    assert!(body["artifacts"]["model"]["cv_score"].is_number());
    assert_eq!(body["stats"]["pair_id"], body["artifacts"]["pair_id"]);
}

#[tokio::test]
async fn test_assets_served_when_configured() {
    let dir = temp_dir();
    let (artifacts, _, _) = train_into(dir.path(), 60);
    let assets = dir.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("style.css"), "body {}").unwrap();

    let service = PredictionService::load(&artifacts).unwrap();
    let state = AppState::new(Arc::new(service), UiConfig::default()).with_assets(assets);
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/assets/style.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "body {}");
}

#[tokio::test]
async fn test_json_prediction_with_missing_field_is_validation_error() {
    let (app, _dir) = setup();

    let incomplete = json!({
        "pregnancies": 1.0,
        "glucose": 90.0,
        "blood_pressure": 72.0,
        "skin_thickness": 35.0,
        "insulin": 0.0,
        "bmi": 30.0,
        "diabetes_pedigree": 0.5
    })
    .to_string();

    for body in [incomplete.as_str(), r#"{"pregnancies": 1.0, "gluc"#] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/predictions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["status"], 400);
    }
}
