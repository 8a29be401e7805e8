//! shared helpers for diagserve integration tests.

#![allow(dead_code)]

use axum::{Router, body::Body, http::Request, response::Response};
use diagserve::{create_app, service::DiagService};
use diagserve_db::DiagDb;
use diagserve_types::{Config, DiagnosisKey, TemporaryExposureKey};
use tower::ServiceExt;

/// build an app over a fresh in-memory database with default config.
pub async fn test_app() -> (Router, DiagService, DiagDb) {
    test_app_with(Config::default()).await
}

/// build an app over a fresh in-memory database.
pub async fn test_app_with(config: Config) -> (Router, DiagService, DiagDb) {
    let db = DiagDb::new_in_memory()
        .await
        .expect("failed to create in-memory database");
    let service = DiagService::new(db.clone(), &config)
        .await
        .expect("failed to construct publication service");
    let app = create_app(db.clone(), service.clone(), config.exposure.clone());
    (app, service, db)
}

/// a diagnosis key whose 16 key bytes are all `fill`.
pub fn key(fill: u8) -> DiagnosisKey {
    DiagnosisKey::new(TemporaryExposureKey::from_bytes([fill; 16]), 42, 50)
}

/// run one request against a clone of the app.
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone()
        .oneshot(request)
        .await
        .expect("request failed")
}

/// drain a response body.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body")
        .to_vec()
}

/// header value as a string, panicking when absent.
pub fn header_str(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header: {name}"))
        .to_str()
        .expect("header should be valid utf-8")
        .to_string()
}
