//! integration tests for the `/exposure-config` endpoint

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{send, test_app_with};
use diagserve_types::{Config, ExposureConfig};

#[tokio::test]
async fn test_serves_configured_parameters_as_camel_case_json() {
    let config = Config {
        exposure: ExposureConfig {
            minimum_risk_score: 10,
            transmission_risk_weight: 70,
            ..ExposureConfig::default()
        },
        ..Config::default()
    };
    let (app, _service, _db) = test_app_with(config).await;

    let request = Request::builder()
        .method("GET")
        .uri("/exposure-config")
        .body(Body::empty())
        .expect("failed to build request");
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("failed to parse response");

    assert_eq!(json["minimumRiskScore"], 10);
    assert_eq!(json["transmissionRiskWeight"], 70);
    assert_eq!(
        json["attenuationLevelValues"],
        serde_json::json!([1, 2, 3, 4, 5, 6, 7, 8])
    );
}
