//! Error response implementation.

use super::types::ApiError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use longbox_audit_capture::AuditError;
use longbox_rbac::RbacError;
use serde::Serialize;
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(
                error = ?self,
                code = self.error_code(),
                "Server error occurred"
            );
        }

        let status = self.status_code();
        let code = self.error_code();

        let (message, reason) = match self {
            ApiError::AccessDenied { reason } => ("Access denied".to_string(), Some(reason)),
            // Store and driver messages stay in the server log.
            ApiError::Internal(_) => ("An internal error occurred".to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code,
                message,
                reason,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RbacError> for ApiError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::Store(store) => ApiError::Internal(store.into()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use longbox_rbac::StoreError;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_access_denied_body_has_marker_and_reason() {
        let (status, body) = body_json(ApiError::access_denied(
            "Insufficient permissions for role: viewer",
        ))
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "access_denied");
        assert_eq!(body["error"]["message"], "Access denied");
        assert_eq!(
            body["error"]["reason"],
            "Insufficient permissions for role: viewer"
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_is_distinct_from_denied() {
        let (status, body) = body_json(ApiError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthenticated");
        assert_eq!(body["error"]["message"], "Authentication required");
        assert!(body["error"].get("reason").is_none());
    }

    #[tokio::test]
    async fn test_store_errors_are_not_echoed() {
        let err: ApiError =
            RbacError::Store(StoreError::Backend("disk I/O error at /var/db".into())).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let text = body.to_string();
        assert!(!text.contains("/var/db"));
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_model_errors_are_bad_requests() {
        let err: ApiError = RbacError::UnknownRole("wizard".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
