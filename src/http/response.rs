//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map domain errors to HTTP status codes
//! - Render every error as `{"error": ..., "code": ...}`
//!
//! # Design Decisions
//! - Backend timeouts result in 504 Gateway Timeout
//! - Backend outages result in 503 Service Unavailable
//! - A procedure that did not apply is a 409 Conflict, never a 5xx

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use qrcode::types::QrError;
use serde::Serialize;
use thiserror::Error;

use crate::pix::{DecodeError, PixError};
use crate::registry::RegistryError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Well-formed request with unacceptable content.
    #[error("{0}")]
    Unprocessable(String),

    /// State changed under the guest (sold out, wrong PIN, reserved gift).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Pix(#[from] PixError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("QR rendering failed: {0}")]
    Qr(#[from] QrError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unprocessable(_) | Self::Pix(_) | Self::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Qr(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Registry(e) => match e {
                RegistryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                RegistryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                RegistryError::Rejected(_) => StatusCode::CONFLICT,
                RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RegistryError::Unauthorized | RegistryError::InvalidRecord { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unprocessable(_) => "invalid_request",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Pix(_) => "invalid_payment_request",
            Self::Decode(_) => "invalid_payload",
            Self::Qr(_) => "qr_failed",
            Self::Registry(e) => match e {
                RegistryError::Unavailable(_) => "backend_unavailable",
                RegistryError::Timeout(_) => "backend_timeout",
                RegistryError::Rejected(_) => "rejected",
                RegistryError::NotFound { .. } => "not_found",
                RegistryError::Validation(_) => "invalid_request",
                RegistryError::Unauthorized => "backend_unauthorized",
                RegistryError::InvalidRecord { .. } => "invalid_record",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        // Backend internals are not echoed to guests.
        let error = match &self {
            Self::Registry(RegistryError::Unauthorized) => "Backend refused the admin secret".to_string(),
            Self::Registry(RegistryError::InvalidRecord { entity, .. }) => {
                format!("Backend returned an invalid {} record", entity)
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error, code: self.code() })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
