//! integration tests for uploading to `/diagnosis-keys`
//!
//! uploads are decoded under a strict size cap and become visible on the
//! read path only after the next cache refresh

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_bytes, header_str, key, send, test_app, test_app_with};
use diagserve_types::{Config, wire};

fn post(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/diagnosis-keys")
        .body(Body::from(body))
        .expect("failed to build request")
}

#[tokio::test]
async fn test_upload_is_acknowledged_and_visible_after_refresh() {
    let (app, service, _db) = test_app().await;

    // 16 key bytes, rolling start number 42, risk level 0x32
    let record = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f, 0x10, 0x00, 0x00, 0x00, 0x2a, 0x32,
    ];
    let response = send(&app, post(record.to_vec())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");

    // not visible until the next refresh cycle
    let listed = send(&app, Request::get("/diagnosis-keys").body(Body::empty()).unwrap()).await;
    assert_eq!(header_str(&listed, "content-length"), "0");

    service.refresh().await.unwrap();

    let listed = send(&app, Request::get("/diagnosis-keys").body(Body::empty()).unwrap()).await;
    assert_eq!(header_str(&listed, "content-length"), "21");
    assert_eq!(body_bytes(listed).await, record);
}

#[tokio::test]
async fn test_duplicate_records_in_one_upload_are_absorbed() {
    let (app, service, _db) = test_app().await;

    let mut body = wire::encode(&[key(7)]);
    body.extend_from_slice(&wire::encode(&[key(7)]));
    let response = send(&app, post(body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    service.refresh().await.unwrap();

    let listed = send(&app, Request::get("/diagnosis-keys").body(Body::empty()).unwrap()).await;
    assert_eq!(header_str(&listed, "content-length"), "21");
}

#[tokio::test]
async fn test_repeated_upload_is_idempotent() {
    let (app, service, _db) = test_app().await;
    let body = wire::encode(&[key(1), key(2)]);

    for _ in 0..2 {
        let response = send(&app, post(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"OK");
    }

    service.refresh().await.unwrap();

    let listed = send(&app, Request::get("/diagnosis-keys").body(Body::empty()).unwrap()).await;
    assert_eq!(header_str(&listed, "content-length"), "42");
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let (app, _service, _db) = test_app().await;

    let response = send(&app, post(Vec::new())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_bytes(response).await,
        b"Invalid body: unexpected end of input"
    );
}

#[tokio::test]
async fn test_truncated_record_is_rejected() {
    let (app, _service, _db) = test_app().await;

    for len in [1, 20, 22] {
        let response = send(&app, post(vec![0u8; len])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "length {len}");
        assert_eq!(
            body_bytes(response).await,
            b"Invalid body: unexpected end of input",
            "length {len}"
        );
    }
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let config = Config {
        max_upload_batch_size: 2,
        ..Config::default()
    };
    let (app, _service, _db) = test_app_with(config).await;

    // one byte past the 2-record cap
    let response = send(&app, post(vec![0u8; 2 * 21 + 1])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_bytes(response).await,
        b"Invalid body: request body too large"
    );
}

#[tokio::test]
async fn test_upload_at_the_cap_is_accepted() {
    let config = Config {
        max_upload_batch_size: 2,
        ..Config::default()
    };
    let (app, _service, _db) = test_app_with(config).await;

    let response = send(&app, post(wire::encode(&[key(1), key(2)]))).await;

    assert_eq!(response.status(), StatusCode::OK);
}
