//! API type definitions
//!
//! One fixed request/response schema per operation; validation happens at
//! this boundary before anything reaches the engine core. Field names follow
//! the wire contract (`datadog_api_key`, `datadog_app_key`, `host`,
//! `key_id`, `secret`).

use serde::{Deserialize, Serialize};

use crate::datadog::lease::LeaseRecord;

// ============ Configuration ============

/// Create/update configuration request
///
/// All fields optional at the schema level; the create path enforces
/// presence in the engine.
#[derive(Debug, Deserialize)]
pub struct WriteConfigRequest {
    pub datadog_api_key: Option<String>,
    pub datadog_app_key: Option<String>,
    pub host: Option<String>,
}

/// Stored configuration read-back
#[derive(Debug, Serialize)]
pub struct ReadConfigResponse {
    pub datadog_api_key: String,
    pub datadog_app_key: String,
    pub host: String,
}

// ============ Credentials & leases ============

/// Issued credential response
///
/// `secret` appears here and nowhere else; `key_id` is repeated as lease
/// metadata internally but the returned copy is informational only.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub key_id: String,
    pub secret: String,
    pub lease_id: String,
    /// Lease duration in seconds
    pub lease_duration: u64,
    /// Upper bound on the lease duration in seconds
    pub lease_max_duration: u64,
}

/// Explicit lease revocation request
#[derive(Debug, Deserialize)]
pub struct RevokeLeaseRequest {
    pub lease_id: String,
}

/// Lease listing response (never contains key ids or secrets)
#[derive(Debug, Serialize)]
pub struct LeaseListResponse {
    pub total: usize,
    pub leases: Vec<LeaseRecord>,
}

// ============ Common Responses ============

/// Operation success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorBody {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }

    pub fn authentication_error() -> Self {
        Self::new("authentication_error", "Invalid or missing API key")
    }
}
