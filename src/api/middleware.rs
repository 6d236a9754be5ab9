//! API middleware

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::common::auth;

use super::service::DatadogSecretsService;
use super::types::ApiErrorResponse;

/// Shared API state
#[derive(Clone)]
pub struct AppState {
    /// Service API key
    pub api_key: String,
    /// Secrets engine service
    pub service: Arc<DatadogSecretsService>,
}

impl AppState {
    pub fn new(api_key: impl Into<String>, service: Arc<DatadogSecretsService>) -> Self {
        Self {
            api_key: api_key.into(),
            service,
        }
    }
}

/// API key authentication middleware
pub async fn api_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match auth::extract_api_key(&request) {
        Some(key) if auth::constant_time_eq(&key, &state.api_key) => next.run(request).await,
        _ => {
            let error = ApiErrorResponse::authentication_error();
            (StatusCode::UNAUTHORIZED, Json(error)).into_response()
        }
    }
}

/// CORS middleware layer
///
/// Allows all origins; the API key gate is the access control here.
pub fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
