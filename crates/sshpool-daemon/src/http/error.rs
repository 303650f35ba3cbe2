//! Mapping of registry and channel failures onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use sshpool_core::{ErrorRecord, PoolError, RegistryError};

/// Body of a 404
pub const NOT_FOUND: &str = "NOT FOUND";
/// Body of a 400
pub const BAD_REQUEST: &str = "BAD REQUEST";

#[derive(Debug)]
pub enum ApiError {
    /// Unknown alias
    NotFound(String),
    /// Descriptor could not be parsed
    BadRequest(String),
    /// Handshake or execution failure reported by a channel
    Upstream(ErrorRecord),
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(alias) => ApiError::NotFound(alias),
            RegistryError::Dsn(e) => ApiError::BadRequest(e.to_string()),
            RegistryError::Connect(e) => ApiError::Upstream(ErrorRecord::from(&e)),
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Registry(e) => e.into(),
            PoolError::Dsn(e) => ApiError::BadRequest(e.to_string()),
            PoolError::Connect(e) => ApiError::Upstream(ErrorRecord::from(&e)),
            PoolError::Exec(e) => ApiError::Upstream(e.record()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(alias) => {
                tracing::debug!(%alias, "Channel not found");
                (StatusCode::NOT_FOUND, NOT_FOUND).into_response()
            }
            ApiError::BadRequest(reason) => {
                tracing::warn!(%reason, "Rejected descriptor");
                (StatusCode::BAD_REQUEST, BAD_REQUEST).into_response()
            }
            ApiError::Upstream(record) => {
                tracing::warn!(kind = %record.kind, exception = %record.exception, "Channel error");
                (StatusCode::BAD_GATEWAY, Json(record)).into_response()
            }
            ApiError::Internal(reason) => {
                tracing::error!(%reason, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, reason).into_response()
            }
        }
    }
}
