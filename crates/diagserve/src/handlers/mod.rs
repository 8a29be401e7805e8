//! http handlers for diagserve api endpoints.

mod conditional;
mod diagnosis_keys;
mod error;
mod exposure_config;
mod health;

pub use diagnosis_keys::{list_diagnosis_keys, post_diagnosis_keys};
pub use error::ApiError;
pub use exposure_config::exposure_config;
pub use health::health;
