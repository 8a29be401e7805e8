//! health check endpoint handler

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use diagserve_db::Repository;
use serde::Serialize;
use tokio::time::timeout;

use crate::AppState;

/// how long the repository ping may take before the check fails
const PING_DEADLINE: Duration = Duration::from_secs(1);

/// health check outcome, rendered lowercase per the health+json convention
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Pass,
    Fail,
}

/// body of a health check response
#[derive(Debug, Serialize)]
struct Health {
    status: Status,
}

/// GET /health - liveness of the service and its repository.
///
/// a publication server with an unreachable repository can still answer
/// reads from the cache, but it can no longer ingest uploads or refresh,
/// so degraded storage is reported as a failure.
pub async fn health(State(state): State<AppState>) -> Response {
    let reachable = matches!(
        timeout(PING_DEADLINE, state.db.ping()).await,
        Ok(Ok(()))
    );

    let (code, status) = if reachable {
        (StatusCode::OK, Status::Pass)
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, Status::Fail)
    };

    (
        code,
        [(
            header::CONTENT_TYPE,
            "application/health+json; charset=utf-8",
        )],
        Json(Health { status }),
    )
        .into_response()
}
