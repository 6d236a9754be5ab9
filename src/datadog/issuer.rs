//! Credential issuance
//!
//! Mints a new Datadog API key under a generated unique name and wraps it
//! into an [`IssuedCredential`] for the lease layer.

use uuid::Uuid;

use super::client::KeyManagement;
use super::client_cache::ClientCache;
use super::error::SecretsError;

/// Prefix of every generated API key name
pub const API_KEY_NAME_PREFIX: &str = "ddkeys-";

/// A dynamically issued credential
///
/// `secret` is handed to the caller exactly once. `key_id` exists only so the
/// key can be revoked later; the lease layer keeps it as internal metadata.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub key_id: String,
    pub secret: String,
}

/// Issue a new API key through the cached client
///
/// The generated name is the fixed prefix plus a random UUID. Uniqueness
/// rests entirely on that generator: a colliding name surfaces as the
/// external API's error and is not retried with a fresh name.
pub async fn issue_api_key<C: KeyManagement>(
    cache: &ClientCache<C>,
) -> Result<IssuedCredential, SecretsError> {
    let client = cache.get()?;

    let name = format!("{}{}", API_KEY_NAME_PREFIX, Uuid::new_v4());
    tracing::info!(%name, "creating new Datadog API key");

    let created = client.create_api_key(&name).await.inspect_err(|e| {
        tracing::error!(error = %e, %name, "error creating Datadog API key");
    })?;

    if created.id.is_empty() || created.key.is_empty() {
        tracing::error!(%name, "Datadog returned an incomplete API key");
        return Err(SecretsError::InvariantViolation(
            "issued credential incomplete: missing key id or secret".to_string(),
        ));
    }

    Ok(IssuedCredential {
        key_id: created.id,
        secret: created.key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadog::testing::{MockKeyManagement, mock_cache};

    #[tokio::test]
    async fn test_issue_returns_complete_credential() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let cache = mock_cache(&mock);

        let credential = issue_api_key(&cache).await.unwrap();
        assert_eq!(credential.key_id, "abc-123");
        assert_eq!(credential.secret, "dd-secret");
        assert_eq!(mock.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_generated_names_are_prefixed_and_unique() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let cache = mock_cache(&mock);

        issue_api_key(&cache).await.unwrap();
        issue_api_key(&cache).await.unwrap();

        let names = mock.created_names();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with(API_KEY_NAME_PREFIX)));
        assert_ne!(names[0], names[1]);
    }

    #[tokio::test]
    async fn test_empty_secret_is_invariant_violation() {
        let mock = MockKeyManagement::returning("abc-123", "");
        let cache = mock_cache(&mock);

        let result = issue_api_key(&cache).await;
        assert!(matches!(
            result,
            Err(SecretsError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_key_id_is_invariant_violation() {
        let mock = MockKeyManagement::returning("", "dd-secret");
        let cache = mock_cache(&mock);

        assert!(matches!(
            issue_api_key(&cache).await,
            Err(SecretsError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_external_failure_surfaces_as_issuance_error() {
        let mock = MockKeyManagement::failing_create("409 name already exists");
        let cache = mock_cache(&mock);

        match issue_api_key(&cache).await {
            Err(SecretsError::Issuance(msg)) => assert!(msg.contains("409")),
            other => panic!("expected issuance error, got {:?}", other.map(|c| c.key_id)),
        }
    }
}
