//! handlers for the `/diagnosis-keys` endpoint.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Method, Response, StatusCode, header},
    response::IntoResponse,
};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use diagserve_types::{TemporaryExposureKey, wire};
use futures_util::StreamExt;
use serde::Deserialize;
use thiserror::Error;

use super::conditional::{self, RangeOutcome};
use super::error::ApiError;
use crate::AppState;

const CACHE_CONTROL: &str = "public, max-age=0, s-maxage=600";

const INVALID_AFTER: &str =
    "Invalid \"after\" query parameter, must be the hexadecimal encoding of a 16 byte key.";

/// query parameters of the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// hex-encoded cursor key; everything strictly after it is returned
    after: Option<String>,
}

/// GET / HEAD /diagnosis-keys - serve the serialized keyset.
///
/// answers entirely from the cache snapshot taken at the top of the
/// request; a concurrent refresh does not affect the response. supports
/// conditional requests and single byte ranges so CDNs can revalidate and
/// resume cheaply.
pub async fn list_diagnosis_keys(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> axum::response::Response {
    let cursor = match params.after.as_deref() {
        None => TemporaryExposureKey::ZERO,
        Some(raw) => match raw.parse() {
            Ok(cursor) => cursor,
            Err(_) => return ApiError::BadRequest(INVALID_AFTER.to_string()).into_response(),
        },
    };

    let (blob, last_modified) = state.service.list(&cursor);

    if conditional::not_modified(&headers, last_modified) {
        let mut builder = Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::CACHE_CONTROL, CACHE_CONTROL);
        if let Some(ts) = last_modified {
            builder = builder.header(header::LAST_MODIFIED, conditional::http_date(ts));
        }
        return builder
            .body(Body::empty())
            .expect("not-modified response headers are valid")
            .into_response();
    }

    if blob.is_empty() {
        return keyset_response(StatusCode::OK, last_modified, Bytes::new(), &method, None);
    }

    match conditional::evaluate_range(&headers, last_modified, blob.len()) {
        RangeOutcome::Full => keyset_response(StatusCode::OK, last_modified, blob, &method, None),
        RangeOutcome::Partial(range) => {
            let content_range = format!("bytes {}-{}/{}", range.start, range.end - 1, blob.len());
            let body = blob.slice(range);
            keyset_response(
                StatusCode::PARTIAL_CONTENT,
                last_modified,
                body,
                &method,
                Some(content_range),
            )
        }
        RangeOutcome::Unsatisfiable => keyset_response(
            StatusCode::RANGE_NOT_SATISFIABLE,
            last_modified,
            Bytes::new(),
            &method,
            Some(format!("bytes */{}", blob.len())),
        ),
    }
}

/// build a keyset response with the contractual headers. HEAD gets the
/// exact same headers (including `Content-Length`) with no body.
fn keyset_response(
    status: StatusCode,
    last_modified: Option<DateTime<Utc>>,
    body: Bytes,
    method: &Method,
    content_range: Option<String>,
) -> axum::response::Response {
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header(header::CONTENT_LENGTH, body.len());
    if let Some(ts) = last_modified {
        builder = builder.header(header::LAST_MODIFIED, conditional::http_date(ts));
    }
    if let Some(content_range) = content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    let body = if *method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(body)
    };
    builder
        .body(body)
        .expect("keyset response headers are valid")
        .into_response()
}

/// POST /diagnosis-keys - ingest an upload batch.
///
/// the body is read under a hard cap of `max_upload_batch_size` records
/// and framed by the wire codec before anything touches the repository.
/// newly stored keys become visible with the next cache refresh.
pub async fn post_diagnosis_keys(State(state): State<AppState>, body: Body) -> axum::response::Response {
    let limit = state.service.max_upload_batch_size() * wire::DIAGNOSIS_KEY_SIZE;

    let payload = match read_bounded(body, limit).await {
        Ok(payload) => payload,
        Err(e) => return ApiError::BadRequest(format!("Invalid body: {e}")).into_response(),
    };

    let keys = match wire::decode(&payload) {
        Ok(keys) => keys,
        Err(e) => return ApiError::BadRequest(format!("Invalid body: {e}")).into_response(),
    };

    // repository failures are logged with context inside the service;
    // the client only sees an opaque 500
    match state.service.store(keys).await {
        Ok(_) => (StatusCode::OK, "OK").into_response(),
        Err(_) => ApiError::Internal.into_response(),
    }
}

/// errors from the size-limited body reader.
#[derive(Debug, Error)]
enum UploadError {
    /// the body exceeded the upload cap
    #[error("request body too large")]
    TooLarge,
    /// the body stream failed mid-read
    #[error("could not read request body")]
    Read(#[source] axum::Error),
}

/// drain the request body into a buffer, failing as soon as the running
/// total exceeds `limit` instead of buffering an unbounded upload.
async fn read_bounded(body: Body, limit: usize) -> Result<Bytes, UploadError> {
    let mut stream = body.into_data_stream();
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(UploadError::Read)?;
        if buf.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
