//! database error types.

use thiserror::Error;

/// errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum Error {
    /// a store was attempted with no keys, or a last-modified timestamp was
    /// requested from an empty store. internal signal, never surfaced over
    /// http.
    #[error("diagnosis key batch cannot be empty")]
    EmptyBatch,

    /// a stored row could not be mapped back to a domain key.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// generic database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for Error {
    fn from(err: sea_orm::DbErr) -> Self {
        match &err {
            sea_orm::DbErr::Conn(e) => Error::Connection(e.to_string()),
            sea_orm::DbErr::ConnectionAcquire(e) => Error::Connection(e.to_string()),
            _ => Error::Database(err.to_string()),
        }
    }
}
