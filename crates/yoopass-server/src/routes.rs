//! Route configuration for the yoopass API.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request};
use axum::routing::{get, post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn, Span};

use crate::config::ServerConfig;
use crate::handlers::{create_secret, health_check, retrieve_secret};
use crate::state::AppState;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create the yoopass API router.
///
/// Every response carries an `x-request-id`, either the caller's or a
/// freshly generated UUID. Requests running past the configured request
/// timeout are answered with `408 Request Timeout`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(state.config());
    let timeout = TimeoutLayer::new(state.config().request_timeout);

    Router::new()
        .route("/health", get(health_check))
        .route("/add", post(create_secret))
        .route("/{identifier}/{key}", get(retrieve_secret))
        .with_state(state)
        .layer(timeout)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Span for one request. Logs the route template, never the raw path,
/// since the path of a read carries the decryption key.
fn request_span(request: &Request) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    info_span!("request", method = %request.method(), route, request_id)
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let mut origins = Vec::with_capacity(config.cors_origins.len());
        for origin in &config.cors_origins {
            match origin.parse() {
                Ok(value) => origins.push(value),
                Err(_) => warn!(origin = %origin, "ignoring unusable CORS origin"),
            }
        }

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
