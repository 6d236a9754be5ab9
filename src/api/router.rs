//! API routing configuration

use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    delete_config, issue_credential, list_leases, read_config, revoke_lease, write_config,
};
use super::middleware::{AppState, api_auth_middleware};

/// Create the secrets engine API router
///
/// # Endpoints
/// - `GET /config` - Read the Datadog configuration
/// - `POST /config` / `PUT /config` - Create or update the configuration
/// - `DELETE /config` - Delete the configuration
/// - `GET /creds/{name}` - Issue a credential under a fresh lease
/// - `GET /leases` - List tracked leases
/// - `POST /leases/revoke` - Revoke a lease
///
/// # Authentication
/// Requires the service API key, supports:
/// - `x-api-key` header
/// - `Authorization: Bearer <token>` header
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/config",
            get(read_config)
                .post(write_config)
                .put(write_config)
                .delete(delete_config),
        )
        .route("/creds/{name}", get(issue_credential))
        .route("/leases", get(list_leases))
        .route("/leases/revoke", post(revoke_lease))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_auth_middleware,
        ))
        .with_state(state)
}
