//! Credential revocation
//!
//! Deletes a previously issued API key by its externally assigned id.

use super::client::KeyManagement;
use super::client_cache::ClientCache;
use super::error::SecretsError;

/// Revoke the API key identified by `key_id`
///
/// The key id is validated before any client lookup or external call — a
/// lease must never be created without later being revocable, so an empty id
/// here is a caller bug. Deletion errors from the external API (including
/// deleting an already-deleted key) are surfaced, never suppressed; whether
/// to treat them as fatal is the caller's decision.
pub async fn revoke_api_key<C: KeyManagement>(
    cache: &ClientCache<C>,
    key_id: &str,
) -> Result<(), SecretsError> {
    if key_id.is_empty() {
        return Err(SecretsError::Validation(
            "key_id must not be empty".to_string(),
        ));
    }

    let client = cache.get()?;

    tracing::info!(%key_id, "revoking Datadog API key");
    client.delete_api_key(key_id).await.inspect_err(|e| {
        tracing::error!(error = %e, %key_id, "error revoking Datadog API key");
    })
}
