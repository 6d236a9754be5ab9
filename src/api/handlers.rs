//! API request handlers
//!
//! Thin translation between wire schemas and the service layer; every input
//! is validated here before it reaches the engine core.

use axum::Json;
use axum::extract::{Path, State};

use crate::datadog::config_store::ConfigUpdate;
use crate::datadog::error::SecretsError;
use crate::datadog::lease::{LEASE_MAX_TTL, LEASE_TTL};

use super::error::ApiError;
use super::middleware::AppState;
use super::types::{
    CredentialResponse, LeaseListResponse, ReadConfigResponse, RevokeLeaseRequest,
    SuccessResponse, WriteConfigRequest,
};

/// `GET /config` - Read the stored Datadog configuration
///
/// An unconfigured backend reads back as all-empty fields.
pub async fn read_config(
    State(state): State<AppState>,
) -> Result<Json<ReadConfigResponse>, ApiError> {
    let config = state.service.read_config()?;
    Ok(Json(ReadConfigResponse {
        datadog_api_key: config.api_key,
        datadog_app_key: config.app_key,
        host: config.host,
    }))
}

/// `POST/PUT /config` - Create or update the Datadog configuration
pub async fn write_config(
    State(state): State<AppState>,
    Json(request): Json<WriteConfigRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.service.write_config(ConfigUpdate {
        api_key: request.datadog_api_key,
        app_key: request.datadog_app_key,
        host: request.host,
    })?;
    Ok(Json(SuccessResponse::new("configuration saved")))
}

/// `DELETE /config` - Delete the Datadog configuration
pub async fn delete_config(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.service.delete_config()?;
    Ok(Json(SuccessResponse::new("configuration deleted")))
}

/// `GET /creds/{name}` - Issue a new credential under a fresh lease
pub async fn issue_credential(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CredentialResponse>, ApiError> {
    validate_credential_name(&name)?;

    let (credential, lease) = state.service.issue_credential(&name).await?;
    Ok(Json(CredentialResponse {
        key_id: credential.key_id,
        secret: credential.secret,
        lease_id: lease.lease_id,
        lease_duration: LEASE_TTL.as_secs(),
        lease_max_duration: LEASE_MAX_TTL.as_secs(),
    }))
}

/// `POST /leases/revoke` - Explicitly revoke a lease
pub async fn revoke_lease(
    State(state): State<AppState>,
    Json(request): Json<RevokeLeaseRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.service.revoke_lease(&request.lease_id).await?;
    Ok(Json(SuccessResponse::new("lease revoked")))
}

/// `GET /leases` - List tracked leases
pub async fn list_leases(State(state): State<AppState>) -> Json<LeaseListResponse> {
    let leases = state.service.list_leases();
    Json(LeaseListResponse {
        total: leases.len(),
        leases,
    })
}

/// The credential name is informational, but still a lowercase identifier
fn validate_credential_name(name: &str) -> Result<(), SecretsError> {
    if name.is_empty() || name.len() > 128 {
        return Err(SecretsError::Validation(
            "name must be between 1 and 128 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(SecretsError::Validation(format!(
            "invalid credential name {:?}: only lowercase letters, digits, '-' and '_' are allowed",
            name
        )));
    }
    Ok(())
}
