//! Secrets engine service layer
//!
//! Orchestrates the engine core for the HTTP boundary: configuration writes
//! with cache invalidation, credential issuance with lease registration,
//! revocation, and the background lease expiry sweeper.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::datadog::client::{DatadogClient, KeyManagement};
use crate::datadog::client_cache::ClientCache;
use crate::datadog::config_store::{ConfigStore, ConfigUpdate, DatadogConfig};
use crate::datadog::error::SecretsError;
use crate::datadog::issuer::{IssuedCredential, issue_api_key};
use crate::datadog::lease::{LeaseRecord, LeaseRegistry};
use crate::datadog::revoker::revoke_api_key;

/// Service over the production Datadog client
pub type DatadogSecretsService = SecretsService<DatadogClient>;

/// Secrets engine service
///
/// Owns the configuration store, the cached client and the lease registry;
/// generic over the key-management client so tests can substitute a mock.
pub struct SecretsService<C> {
    config_store: ConfigStore,
    cache: ClientCache<C>,
    leases: LeaseRegistry,
}

impl<C: KeyManagement> SecretsService<C> {
    pub fn new(config_store: ConfigStore, cache: ClientCache<C>) -> Self {
        Self {
            config_store,
            cache,
            leases: LeaseRegistry::new(),
        }
    }

    /// Read the stored Datadog configuration
    pub fn read_config(&self) -> Result<DatadogConfig, SecretsError> {
        self.config_store.read()
    }

    /// Merge a configuration update and drop any cached client
    ///
    /// Create vs update is decided by record existence. The write is not
    /// complete until invalidation has been issued: a later credential
    /// request must never see a client built from the old configuration.
    pub fn write_config(&self, update: ConfigUpdate) -> Result<(), SecretsError> {
        let is_create = !self.config_store.exists()?;
        self.config_store.write(update, is_create)?;
        self.cache.invalidate();
        tracing::info!(
            fingerprint = %self.config_store.read().map(|c| c.api_key_fingerprint()).unwrap_or_default(),
            "Datadog configuration written, client cache invalidated"
        );
        Ok(())
    }

    /// Delete the stored configuration and drop any cached client
    pub fn delete_config(&self) -> Result<(), SecretsError> {
        self.config_store.delete()?;
        self.cache.invalidate();
        tracing::info!("Datadog configuration deleted, client cache invalidated");
        Ok(())
    }

    /// Issue a credential and register its lease
    ///
    /// `name` is the caller-supplied identifier from the request path,
    /// recorded on the lease for bookkeeping only.
    pub async fn issue_credential(
        &self,
        name: &str,
    ) -> Result<(IssuedCredential, LeaseRecord), SecretsError> {
        let credential = issue_api_key(&self.cache).await?;
        let lease = self.leases.register(&credential, name);
        tracing::info!(lease_id = %lease.lease_id, %name, "credential issued");
        Ok((credential, lease))
    }

    /// Revoke the lease identified by `lease_id`
    pub async fn revoke_lease(&self, lease_id: &str) -> Result<(), SecretsError> {
        if lease_id.is_empty() {
            return Err(SecretsError::Validation(
                "lease_id must not be empty".to_string(),
            ));
        }

        let key_id = self.leases.begin_revoke(lease_id)?;
        match revoke_api_key(&self.cache, &key_id).await {
            Ok(()) => {
                self.leases.complete_revoke(lease_id);
                tracing::info!(%lease_id, "lease revoked");
                Ok(())
            }
            Err(e) => {
                self.leases.fail_revoke(lease_id, &e);
                Err(e)
            }
        }
    }

    /// Snapshot of all tracked leases
    pub fn list_leases(&self) -> Vec<LeaseRecord> {
        self.leases.snapshot()
    }

    /// Revoke every lease expired at `now`
    ///
    /// Each in-flight revocation races the shutdown signal; a cancelled one
    /// restores the lease to ISSUED and aborts the sweep with `Cancelled`.
    pub async fn sweep_expired_leases(
        &self,
        now: DateTime<Utc>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), SecretsError> {
        for lease_id in self.leases.expired_lease_ids(now) {
            let key_id = match self.leases.begin_revoke(&lease_id) {
                Ok(key_id) => key_id,
                // Raced with an explicit revoke; nothing to do
                Err(_) => continue,
            };

            tracing::info!(%lease_id, "lease expired, revoking");
            tokio::select! {
                result = revoke_api_key(&self.cache, &key_id) => match result {
                    Ok(()) => self.leases.complete_revoke(&lease_id),
                    Err(e) => {
                        tracing::warn!(%lease_id, error = %e, "lease revocation failed");
                        self.leases.fail_revoke(&lease_id, &e);
                    }
                },
                _ = shutdown.changed() => {
                    self.leases.restore_issued(&lease_id);
                    let err = SecretsError::Cancelled(format!(
                        "revocation of lease {} aborted by shutdown",
                        lease_id
                    ));
                    tracing::warn!(%lease_id, "{}", err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Background sweeper loop, runs until shutdown
    pub async fn run_lease_sweeper(
        self: Arc<Self>,
        sweep_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.sweep_expired_leases(Utc::now(), &mut shutdown).await.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("lease sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadog::lease::LeaseState;
    use crate::datadog::testing::{MockKeyManagement, configured_store};

    use parking_lot::Mutex;

    fn service_with(mock: &MockKeyManagement) -> SecretsService<MockKeyManagement> {
        let store = configured_store();
        let mock = mock.clone();
        let cache = ClientCache::new(store.clone(), Box::new(move |_| Ok(mock.clone())));
        SecretsService::new(store, cache)
    }

    fn shutdown_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn test_issue_registers_lease_with_internal_key_id() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let service = service_with(&mock);

        let (credential, lease) = service.issue_credential("web").await.unwrap();
        assert_eq!(credential.key_id, "abc-123");
        assert_eq!(lease.key_id, "abc-123");
        assert_eq!(lease.name, "web");
        assert_eq!(service.list_leases().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_lease_deletes_key_and_drops_record() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let service = service_with(&mock);

        let (_, lease) = service.issue_credential("web").await.unwrap();
        service.revoke_lease(&lease.lease_id).await.unwrap();

        assert_eq!(mock.deleted(), vec!["abc-123".to_string()]);
        assert!(service.list_leases().is_empty());
    }

    #[tokio::test]
    async fn test_revoke_failure_is_terminal_and_surfaced() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let service = service_with(&mock);

        let (_, lease) = service.issue_credential("web").await.unwrap();
        mock.fail_delete("503 unavailable");

        let result = service.revoke_lease(&lease.lease_id).await;
        assert!(matches!(result, Err(SecretsError::Revocation(_))));
        assert_eq!(service.list_leases()[0].state, LeaseState::RevocationFailed);
    }

    #[tokio::test]
    async fn test_revoke_empty_lease_id_is_validation_error() {
        let service = service_with(&MockKeyManagement::default());
        assert!(matches!(
            service.revoke_lease("").await,
            Err(SecretsError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_write_config_invalidates_cached_client() {
        let store = configured_store();
        let built_hosts: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let hosts_in_builder = built_hosts.clone();
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let mock_in_builder = mock.clone();
        let cache = ClientCache::new(
            store.clone(),
            Box::new(move |config| {
                hosts_in_builder.lock().push(config.host.clone());
                Ok(mock_in_builder.clone())
            }),
        );
        let service = SecretsService::new(store, cache);

        service.issue_credential("web").await.unwrap();
        assert_eq!(built_hosts.lock().len(), 1);

        // Rotate the endpoint; the next issuance must rebuild from it
        service
            .write_config(ConfigUpdate {
                host: Some("https://api.datadoghq.eu".to_string()),
                ..Default::default()
            })
            .unwrap();
        service.issue_credential("web").await.unwrap();

        let hosts = built_hosts.lock();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[1], "https://api.datadoghq.eu");
    }

    #[tokio::test]
    async fn test_delete_config_makes_issuance_fail() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let service = service_with(&mock);

        service.issue_credential("web").await.unwrap();
        service.delete_config().unwrap();

        assert!(matches!(
            service.issue_credential("web").await,
            Err(SecretsError::ConfigurationMissing)
        ));
    }

    #[tokio::test]
    async fn test_sweep_revokes_expired_leases_only() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let service = service_with(&mock);
        let (_tx, mut shutdown) = shutdown_pair();

        let (_, lease) = service.issue_credential("web").await.unwrap();

        // Not yet expired
        service
            .sweep_expired_leases(lease.issued_at, &mut shutdown)
            .await
            .unwrap();
        assert_eq!(service.list_leases().len(), 1);

        // Past the TTL
        service
            .sweep_expired_leases(lease.issued_at + chrono::Duration::seconds(6), &mut shutdown)
            .await
            .unwrap();
        assert!(service.list_leases().is_empty());
        assert_eq!(mock.deleted(), vec!["abc-123".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_sweep_leaves_terminal_record() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        let service = service_with(&mock);
        let (_tx, mut shutdown) = shutdown_pair();

        let (_, lease) = service.issue_credential("web").await.unwrap();
        mock.fail_delete("503 unavailable");

        service
            .sweep_expired_leases(lease.issued_at + chrono::Duration::seconds(6), &mut shutdown)
            .await
            .unwrap();
        assert_eq!(service.list_leases()[0].state, LeaseState::RevocationFailed);

        // Terminal records are not picked up again
        service
            .sweep_expired_leases(lease.issued_at + chrono::Duration::seconds(60), &mut shutdown)
            .await
            .unwrap();
        assert_eq!(mock.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_inflight_sweep_revocation() {
        let mock = MockKeyManagement::returning("abc-123", "dd-secret");
        mock.delay_delete(Duration::from_secs(5));
        let service = service_with(&mock);
        let (tx, mut shutdown) = shutdown_pair();

        let (_, lease) = service.issue_credential("web").await.unwrap();
        tx.send(true).unwrap();

        let result = service
            .sweep_expired_leases(lease.issued_at + chrono::Duration::seconds(6), &mut shutdown)
            .await;
        assert!(matches!(result, Err(SecretsError::Cancelled(_))));
        // No partial state: the lease is back to ISSUED
        assert_eq!(service.list_leases()[0].state, LeaseState::Issued);
    }
}
