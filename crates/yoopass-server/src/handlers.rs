//! HTTP request handlers for the yoopass API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{CreateSecretRequest, CreateSecretResponse, HealthResponse, RetrieveSecretResponse};
use crate::validation::validate_create;

/// Handle GET /health - health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle POST /add - seal and store a new secret.
///
/// # Errors
///
/// Returns 400 for malformed or invalid bodies and 500 if the secret
/// cannot be stored.
pub async fn create_secret(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSecretRequest>, JsonRejection>,
) -> ApiResult<Json<CreateSecretResponse>> {
    let Json(request) = payload.map_err(reject_body)?;

    let valid = validate_create(request, state.limits()).map_err(|errors| {
        debug!(op = "handlers.create_secret", fields = errors.len(), "create request failed validation");
        ApiError::Validation(errors)
    })?;

    let handle = state
        .service()
        .create(&valid.message, valid.ttl, valid.one_time)
        .await
        .map_err(|err| {
            let err = ApiError::from_create(err);
            if let ApiError::CreateFailed(cause) = &err {
                warn!(op = "handlers.create_secret", error = %cause, "failed to store secret");
            }
            err
        })?;

    Ok(Json(CreateSecretResponse::new(
        handle.identifier(),
        handle.key_hex(),
    )))
}

/// Handle GET /{identifier}/{key} - open a secret.
///
/// # Errors
///
/// Returns 404 if the secret is unknown, expired, consumed or the key is
/// wrong, and 500 for store failures.
pub async fn retrieve_secret(
    State(state): State<Arc<AppState>>,
    Path((identifier, key)): Path<(String, String)>,
) -> ApiResult<Json<RetrieveSecretResponse>> {
    let message = state
        .service()
        .retrieve_encoded(&identifier, &key)
        .await
        .map_err(|err| {
            let err = ApiError::from_retrieve(err);
            if let ApiError::RetrieveFailed(cause) = &err {
                warn!(op = "handlers.retrieve_secret", error = %cause, "failed to open secret");
            }
            err
        })?;

    Ok(Json(RetrieveSecretResponse::new(message)))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    let (kind, message) = match rejection {
        JsonRejection::JsonSyntaxError(_) => (
            "syntax",
            "Invalid request format: malformed JSON.".to_string(),
        ),
        JsonRejection::JsonDataError(err) => (
            "data",
            format!("Invalid request format: {}", err.body_text()),
        ),
        JsonRejection::MissingJsonContentType(_) => (
            "content-type",
            "Invalid request format: expected Content-Type: application/json.".to_string(),
        ),
        _ => ("body", "Invalid request format.".to_string()),
    };
    debug!(op = "handlers.create_secret", kind, "rejected create request body");
    ApiError::InvalidRequest(message)
}
