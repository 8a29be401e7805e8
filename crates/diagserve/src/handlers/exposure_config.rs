//! handler serving the exposure notification scoring parameters.

use axum::{Json, extract::State};
use diagserve_types::ExposureConfig;

use crate::AppState;

/// GET /exposure-config - the scoring parameters clients feed to the
/// on-device exposure notification framework. static per process; served
/// straight from configuration.
pub async fn exposure_config(State(state): State<AppState>) -> Json<ExposureConfig> {
    Json(state.exposure.clone())
}
