//! Datadog Key Management API client
//!
//! Authenticated handle over the Datadog v2 Key Management endpoints.
//! A handle is bound to one configuration snapshot; rotation of the stored
//! admin credentials invalidates it through the client cache.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::http_client::{ProxyConfig, build_client};
use crate::model::config::TlsBackend;

use super::config_store::DatadogConfig;
use super::error::SecretsError;

/// A freshly created API key as returned by the external API
///
/// `key` is the secret value; it is returned exactly once and never stored.
#[derive(Debug, Clone)]
pub struct CreatedApiKey {
    pub id: String,
    pub key: String,
}

/// External key-management operations
///
/// Implementations must be `Send + Sync` so a handle can be shared across
/// request tasks behind an `Arc`. Tests substitute a mock implementation.
pub trait KeyManagement: Send + Sync {
    /// Create a new API key named `name`
    fn create_api_key(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<CreatedApiKey, SecretsError>> + Send;

    /// Delete the API key identified by `key_id`
    fn delete_api_key(
        &self,
        key_id: &str,
    ) -> impl std::future::Future<Output = Result<(), SecretsError>> + Send;
}

// ============ Wire types (Datadog v2 Key Management) ============

#[derive(Debug, Serialize)]
struct ApiKeyCreateRequest {
    data: ApiKeyCreateData,
}

#[derive(Debug, Serialize)]
struct ApiKeyCreateData {
    #[serde(rename = "type")]
    kind: String,
    attributes: ApiKeyCreateAttributes,
}

#[derive(Debug, Serialize)]
struct ApiKeyCreateAttributes {
    name: String,
}

impl ApiKeyCreateRequest {
    fn new(name: &str) -> Self {
        Self {
            data: ApiKeyCreateData {
                kind: "api_keys".to_string(),
                attributes: ApiKeyCreateAttributes {
                    name: name.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiKeyResponse {
    data: Option<ApiKeyResponseData>,
}

#[derive(Debug, Deserialize)]
struct ApiKeyResponseData {
    #[serde(default)]
    id: Option<String>,
    attributes: Option<ApiKeyResponseAttributes>,
}

#[derive(Debug, Deserialize)]
struct ApiKeyResponseAttributes {
    #[serde(default)]
    key: Option<String>,
}

/// Datadog API client handle
///
/// Built from one [`DatadogConfig`] snapshot. Construction validates the
/// endpoint and assembles the HTTP client; it performs no network I/O.
pub struct DatadogClient {
    base_url: Url,
    api_key: String,
    app_key: String,
    http: Client,
}

impl DatadogClient {
    /// Build a client handle from a configuration snapshot
    pub fn from_config(
        config: &DatadogConfig,
        proxy: Option<&ProxyConfig>,
        timeout: Duration,
        tls_backend: TlsBackend,
    ) -> Result<Self, SecretsError> {
        let base_url = parse_endpoint(&config.host)?;
        let http = build_client(proxy, timeout.as_secs(), tls_backend)
            .map_err(|e| SecretsError::ClientConstruction(e.to_string()))?;

        tracing::debug!(
            endpoint = %base_url,
            api_key_fingerprint = %config.api_key_fingerprint(),
            "Datadog client constructed"
        );

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            app_key: config.app_key.clone(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SecretsError> {
        self.base_url
            .join(path)
            .map_err(|e| SecretsError::ClientConstruction(format!("invalid endpoint path: {}", e)))
    }
}

impl KeyManagement for DatadogClient {
    async fn create_api_key(&self, name: &str) -> Result<CreatedApiKey, SecretsError> {
        let url = self.endpoint("api/v2/api_keys")?;
        let body = ApiKeyCreateRequest::new(name);

        let response = self
            .http
            .post(url)
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SecretsError::Issuance(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let error_msg = match status.as_u16() {
                401 | 403 => "admin credentials rejected by Datadog",
                409 => "API key name already exists",
                429 => "too many requests, rate limited",
                500..=599 => "Datadog service temporarily unavailable",
                _ => "API key creation failed",
            };
            return Err(SecretsError::Issuance(format!(
                "{}: {} {}",
                error_msg, status, body_text
            )));
        }

        let data: ApiKeyResponse = response
            .json()
            .await
            .map_err(|e| SecretsError::Issuance(format!("invalid response body: {}", e)))?;

        let data = data.data.unwrap_or(ApiKeyResponseData {
            id: None,
            attributes: None,
        });
        Ok(CreatedApiKey {
            id: data.id.unwrap_or_default(),
            key: data
                .attributes
                .and_then(|a| a.key)
                .unwrap_or_default(),
        })
    }

    async fn delete_api_key(&self, key_id: &str) -> Result<(), SecretsError> {
        let url = self.endpoint(&format!("api/v2/api_keys/{}", urlencoding::encode(key_id)))?;

        let response = self
            .http
            .delete(url)
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key)
            .send()
            .await
            .map_err(|e| SecretsError::Revocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let error_msg = match status.as_u16() {
                401 | 403 => "admin credentials rejected by Datadog",
                404 => "API key not found",
                429 => "too many requests, rate limited",
                500..=599 => "Datadog service temporarily unavailable",
                _ => "API key deletion failed",
            };
            return Err(SecretsError::Revocation(format!(
                "{}: {} {}",
                error_msg, status, body_text
            )));
        }

        Ok(())
    }
}

/// Normalize and validate the configured host
///
/// Accepts a bare host (`api.datadoghq.com`) or a full URL; bare hosts get
/// an `https://` scheme. The trailing slash keeps `Url::join` from eating
/// the last path segment.
fn parse_endpoint(host: &str) -> Result<Url, SecretsError> {
    let with_scheme = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    let normalized = if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{}/", with_scheme)
    };

    Url::parse(&normalized)
        .map_err(|e| SecretsError::ClientConstruction(format!("malformed host {:?}: {}", host, e)))
}
