//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tenantgate_shared::TenantError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Access errors
    #[error("{0}")]
    Forbidden(String),

    // Resource errors
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),
    #[error("Resource already exists")]
    Conflict(String),

    // Internal errors
    #[error("Directory error: {0}")]
    Directory(String),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Validation
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }

            // Access
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),

            // Resources
            ApiError::TenantNotFound(_) => {
                (StatusCode::NOT_FOUND, "TENANT_NOT_FOUND", self.to_string())
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),

            // Internal
            ApiError::Directory(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DIRECTORY_ERROR",
                "Tenant directory unavailable".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::InvalidSubdomain(msg) | TenantError::InvalidIcon(msg) => {
                ApiError::Validation(msg)
            }
            TenantError::ReservedSubdomain(sub) => {
                ApiError::Validation(format!("subdomain '{sub}' is reserved"))
            }
            TenantError::AlreadyExists(sub) => {
                ApiError::Conflict(format!("subdomain '{sub}' is already taken"))
            }
            TenantError::Storage(msg) => {
                tracing::error!(error = %msg, "Tenant directory error");
                ApiError::Directory(msg)
            }
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ApiError::TenantNotFound("ghost".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("taken".into()), StatusCode::CONFLICT),
            (ApiError::Directory("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
