//! API Errors
//! Mission: One taxonomy for every failure a request can end with

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Terminal request failures
#[derive(Debug)]
pub enum ApiError {
    /// Duplicate unique field on signup
    Conflict(String),
    /// Bad credentials, or missing/invalid identity token
    Unauthorized(String),
    /// Malformed create payload
    Validation(String),
    /// Delete target absent or owned by someone else
    NotFoundOrUnauthorized(String),
    /// Storage fault
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Conflict(_) => "conflict",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFoundOrUnauthorized(_) => "not_found_or_unauthorized",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Signup conflicts keep the 400 the browser client already handles.
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFoundOrUnauthorized(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Validation(msg)
            | ApiError::NotFoundOrUnauthorized(msg) => write!(f, "{}", msg),
            ApiError::Internal(e) => write!(f, "Internal server error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!("❌ Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "error": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_statuses() {
        let conflict = ApiError::Conflict("Email already in use.".into()).into_response();
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let unauthorized = ApiError::Unauthorized("Unauthorized".into()).into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let validation = ApiError::Validation("name is required".into()).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let missing = ApiError::NotFoundOrUnauthorized("gone".into()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let internal = ApiError::Internal(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = ApiError::Internal(anyhow::anyhow!("secret table name"));
        assert_eq!(err.code(), "internal_error");
        assert!(err.to_string().contains("secret table name"));

        let validation = ApiError::Validation("status must be Present or Absent".into());
        assert_eq!(validation.code(), "validation_error");
        assert_eq!(validation.to_string(), "status must be Present or Absent");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::Internal(anyhow::anyhow!("secret table name")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "Internal server error");
    }
}
