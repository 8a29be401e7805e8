//! diagserve library - http handlers and application setup.
//!
//! the server publishes exposure notification diagnosis keys: health
//! authority clients POST small batches, devices GET the complete keyset.
//! reads are answered from an in-memory serialized cache that a background
//! task rehydrates from the repository on a fixed interval.

pub mod cache;
pub mod cli;
pub mod handlers;
pub mod service;

use axum::{Router, routing::get};
use diagserve_db::DiagDb;
use diagserve_types::ExposureConfig;

use service::DiagService;

/// application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// repository, used directly only by the health check.
    pub db: DiagDb,
    /// the publication service mediating cache and repository.
    pub service: DiagService,
    /// scoring parameters served on `/exposure-config`.
    pub exposure: ExposureConfig,
}

/// create the axum application with all routes.
///
/// the method router on `/diagnosis-keys` yields `405 Method Not Allowed`
/// for anything other than GET/HEAD/POST.
pub fn create_app(db: DiagDb, service: DiagService, exposure: ExposureConfig) -> Router {
    let state = AppState {
        db,
        service,
        exposure,
    };

    Router::new()
        .route(
            "/diagnosis-keys",
            get(handlers::list_diagnosis_keys).post(handlers::post_diagnosis_keys),
        )
        .route("/exposure-config", get(handlers::exposure_config))
        .route("/health", get(handlers::health))
        .with_state(state)
}
