//! API error mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::datadog::error::SecretsError;

use super::types::ApiErrorResponse;

/// HTTP-facing wrapper around [`SecretsError`]
///
/// Handlers return `Result<_, ApiError>`; the conversion picks the status
/// code and wire error type, keeping the engine core free of HTTP concerns.
#[derive(Debug)]
pub struct ApiError(pub SecretsError);

impl From<SecretsError> for ApiError {
    fn from(err: SecretsError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Get corresponding HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            SecretsError::Validation(_) => StatusCode::BAD_REQUEST,
            SecretsError::ConfigurationMissing => StatusCode::BAD_REQUEST,
            SecretsError::ClientConstruction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SecretsError::Issuance(_)
            | SecretsError::Revocation(_)
            | SecretsError::InvariantViolation(_) => StatusCode::BAD_GATEWAY,
            SecretsError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SecretsError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_type(&self) -> &'static str {
        match self.0 {
            SecretsError::Validation(_) | SecretsError::ConfigurationMissing => "invalid_request",
            SecretsError::Issuance(_)
            | SecretsError::Revocation(_)
            | SecretsError::InvariantViolation(_) => "api_error",
            SecretsError::ClientConstruction(_) | SecretsError::Storage(_) => "internal_error",
            SecretsError::Cancelled(_) => "cancelled",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse::new(self.error_type(), self.0.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}
