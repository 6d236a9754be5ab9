//! Invalidation-aware client handle cache
//!
//! Client construction (endpoint validation, HTTP client assembly) is
//! expensive enough to cache, but a handle must never survive a rotation of
//! the stored admin credentials. The cache holds at most one live handle and
//! is emptied by [`ClientCache::invalidate`] whenever the configuration
//! changes.

use std::sync::Arc;

use parking_lot::RwLock;

use super::config_store::{ConfigStore, DatadogConfig};
use super::error::SecretsError;

/// Builds a client handle from a configuration snapshot
pub type ClientBuilder<C> =
    Box<dyn Fn(&DatadogConfig) -> Result<C, SecretsError> + Send + Sync>;

/// Lazily populated, invalidation-aware cache of one client handle
///
/// Concurrent `get` calls on the populated fast path proceed in parallel
/// under the read lock; population and invalidation take the write lock and
/// serialize against all other cache access.
pub struct ClientCache<C> {
    config_store: ConfigStore,
    build: ClientBuilder<C>,
    slot: RwLock<Option<Arc<C>>>,
}

impl<C> ClientCache<C> {
    pub fn new(config_store: ConfigStore, build: ClientBuilder<C>) -> Self {
        Self {
            config_store,
            build,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached handle, constructing it first if necessary
    ///
    /// The slow path re-checks the slot under the write lock: of N callers
    /// racing an empty cache, exactly one constructs, the rest reuse its
    /// handle. A failed read or construction publishes nothing.
    pub fn get(&self) -> Result<Arc<C>, SecretsError> {
        if let Some(client) = self.slot.read().as_ref() {
            return Ok(Arc::clone(client));
        }

        let mut slot = self.slot.write();
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let config = self.config_store.read().inspect_err(|e| {
            tracing::error!(error = %e, "error getting configuration");
        })?;
        if !config.is_configured() {
            return Err(SecretsError::ConfigurationMissing);
        }

        let client = Arc::new((self.build)(&config).inspect_err(|e| {
            tracing::error!(error = %e, "error creating new api client from config");
        })?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Discard any cached handle
    ///
    /// After this returns, the next `get` rebuilds from the latest stored
    /// configuration.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}
