//! Error types for the yoopass server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use yoopass_secrets::StoreError;

use crate::types::{ErrorResponse, FieldError, ValidationErrorResponse};

/// Body text for a missing, expired, consumed or undecryptable secret.
pub const NOT_FOUND_MESSAGE: &str = "secret not found";

/// Body text when a new secret could not be stored.
pub const CREATE_FAILED_MESSAGE: &str = "failed to store secret";

/// Body text for every other server-side failure.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Result type alias for server operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur in the yoopass server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Startup configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The storage backend could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// One or more request fields failed validation.
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The request body could not be understood.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The secret does not exist or cannot be opened with the given key.
    #[error("secret not found")]
    NotFound,

    /// Creating a secret failed on the server side.
    #[error("create failed: {0}")]
    CreateFailed(#[source] yoopass_secrets::Error),

    /// Retrieving a secret failed on the server side.
    #[error("retrieve failed: {0}")]
    RetrieveFailed(#[source] yoopass_secrets::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Map a failure from the create path.
    #[must_use]
    pub fn from_create(err: yoopass_secrets::Error) -> Self {
        if err.is_client_error() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::CreateFailed(err)
        }
    }

    /// Map a failure from the retrieve path.
    ///
    /// Malformed tokens are indistinguishable from unknown secrets.
    #[must_use]
    pub fn from_retrieve(err: yoopass_secrets::Error) -> Self {
        if err.is_not_found() || err.is_client_error() {
            Self::NotFound
        } else {
            Self::RetrieveFailed(err)
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BindFailed(_, _)
            | Self::InvalidConfig(_)
            | Self::Store(_)
            | Self::CreateFailed(_)
            | Self::RetrieveFailed(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Self::Validation(errors) => {
                (status, Json(ValidationErrorResponse::new(errors))).into_response()
            }
            Self::InvalidRequest(message) => {
                (status, Json(ErrorResponse::new(message))).into_response()
            }
            Self::NotFound => (status, Json(ErrorResponse::new(NOT_FOUND_MESSAGE))).into_response(),
            Self::CreateFailed(_) => {
                (status, Json(ErrorResponse::new(CREATE_FAILED_MESSAGE))).into_response()
            }
            Self::BindFailed(_, _)
            | Self::InvalidConfig(_)
            | Self::Store(_)
            | Self::RetrieveFailed(_)
            | Self::Internal(_) => {
                (status, Json(ErrorResponse::new(INTERNAL_MESSAGE))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use yoopass_secrets::Error;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn offline() -> StoreError {
        StoreError::Unavailable {
            reason: "connection refused to 10.0.0.7".to_string(),
        }
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let (status, json) = body_json(ApiError::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["error"], "secret not found");
    }

    #[tokio::test]
    async fn test_validation_response() {
        let err = ApiError::Validation(vec![FieldError::required("message")]);
        let (status, json) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["type"], "validation");
        assert_eq!(json["errors"][0]["field"], "message");
        assert_eq!(json["errors"][0]["error"], "This field is required");
    }

    #[tokio::test]
    async fn test_invalid_request_response() {
        let (status, json) =
            body_json(ApiError::InvalidRequest("Invalid request format.".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid request format.");
    }

    #[tokio::test]
    async fn test_create_failure_hides_store_detail() {
        let (status, json) = body_json(ApiError::from_create(Error::PersistenceFailed(offline()))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "failed to store secret");
        assert!(!json.to_string().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_retrieve_failure_is_generic() {
        let (status, json) = body_json(ApiError::from_retrieve(Error::DeletionFailed(offline()))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "internal server error");
        assert!(!json.to_string().contains("delete"));
    }

    #[test]
    fn test_retrieve_mapping() {
        assert!(matches!(ApiError::from_retrieve(Error::NotFound), ApiError::NotFound));
        assert!(matches!(
            ApiError::from_retrieve(Error::InvalidIdentifier {
                reason: "bad".to_string()
            }),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from_retrieve(Error::StoreUnavailable(offline())),
            ApiError::RetrieveFailed(_)
        ));
    }

    #[test]
    fn test_create_mapping() {
        assert!(matches!(
            ApiError::from_create(Error::InvalidInput {
                reason: "message must not be empty".to_string()
            }),
            ApiError::InvalidRequest(_)
        ));
        assert!(matches!(
            ApiError::from_create(Error::PersistenceFailed(offline())),
            ApiError::CreateFailed(_)
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::InvalidConfig("unknown store 'x'".to_string());
        assert_eq!(err.to_string(), "invalid configuration: unknown store 'x'");

        let err = ApiError::Validation(vec![FieldError::required("message")]);
        assert_eq!(err.to_string(), "validation failed for 1 field(s)");
    }
}
