/// Unified error types for the school CMS
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the CMS
#[derive(Error, Debug)]
pub enum CmsError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Validation errors (missing or malformed fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Media adapter errors (decode, upload, CDN)
    #[error("Media upload failed: {0}")]
    Media(String),

    /// Email delivery errors
    #[error("Email error: {0}")]
    Email(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON column (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<validator::ValidationErrors> for CmsError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort_unstable();
        CmsError::Validation(format!("Invalid or missing fields: {}", fields.join(", ")))
    }
}

/// Convert CmsError to HTTP response
impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            // Authentication failures carry no detail to the caller
            CmsError::Authentication(ref reason) => {
                tracing::debug!("Rejected admin request: {}", reason);
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized",
                    "Unauthorized".to_string(),
                )
            }
            CmsError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            CmsError::Media(_) => (
                StatusCode::BAD_REQUEST,
                "MediaUploadFailed",
                self.to_string(),
            ),
            CmsError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            CmsError::Database(_)
            | CmsError::Internal(_)
            | CmsError::Io(_)
            | CmsError::Serialization(_)
            | CmsError::Email(_) => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for CMS operations
pub type CmsResult<T> = Result<T, CmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CmsError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CmsError::Media("x".into()), StatusCode::BAD_REQUEST),
            (CmsError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (CmsError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CmsError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (CmsError::Email("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_authentication_error_has_no_detail() {
        let response =
            CmsError::Authentication("Invalid token signature".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(parsed.error, "Unauthorized");
        assert_eq!(parsed.message, "Unauthorized");
    }
}
