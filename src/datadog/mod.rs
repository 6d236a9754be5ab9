//! Datadog secrets engine core
//!
//! Configuration storage, the cached API client, credential issuance and
//! revocation, and lease bookkeeping.

pub mod client;
pub mod client_cache;
pub mod config_store;
pub mod error;
pub mod issuer;
pub mod lease;
pub mod revoker;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared test doubles for the key-management seam

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::client::{CreatedApiKey, KeyManagement};
    use super::client_cache::ClientCache;
    use super::config_store::{ConfigStore, ConfigUpdate};
    use super::error::SecretsError;
    use crate::storage::MemoryStorage;

    /// Scriptable [`KeyManagement`] implementation
    #[derive(Clone, Default)]
    pub struct MockKeyManagement {
        inner: Arc<MockInner>,
    }

    #[derive(Default)]
    struct MockInner {
        create_calls: AtomicUsize,
        delete_calls: AtomicUsize,
        next_key: Mutex<Option<CreatedApiKey>>,
        create_failure: Mutex<Option<String>>,
        delete_failure: Mutex<Option<String>>,
        delete_delay: Mutex<Option<Duration>>,
        created_names: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
    }

    impl MockKeyManagement {
        pub fn returning(id: &str, key: &str) -> Self {
            let mock = Self::default();
            *mock.inner.next_key.lock() = Some(CreatedApiKey {
                id: id.to_string(),
                key: key.to_string(),
            });
            mock
        }

        pub fn failing_create(message: &str) -> Self {
            let mock = Self::default();
            *mock.inner.create_failure.lock() = Some(message.to_string());
            mock
        }

        pub fn fail_delete(&self, message: &str) {
            *self.inner.delete_failure.lock() = Some(message.to_string());
        }

        /// Make every delete call sleep first (for cancellation tests)
        pub fn delay_delete(&self, delay: Duration) {
            *self.inner.delete_delay.lock() = Some(delay);
        }

        pub fn create_calls(&self) -> usize {
            self.inner.create_calls.load(Ordering::SeqCst)
        }

        pub fn delete_calls(&self) -> usize {
            self.inner.delete_calls.load(Ordering::SeqCst)
        }

        pub fn deleted(&self) -> Vec<String> {
            self.inner.deleted.lock().clone()
        }

        pub fn created_names(&self) -> Vec<String> {
            self.inner.created_names.lock().clone()
        }
    }

    impl KeyManagement for MockKeyManagement {
        async fn create_api_key(&self, name: &str) -> Result<CreatedApiKey, SecretsError> {
            self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.created_names.lock().push(name.to_string());
            if let Some(msg) = self.inner.create_failure.lock().clone() {
                return Err(SecretsError::Issuance(msg));
            }
            Ok(self
                .inner
                .next_key
                .lock()
                .clone()
                .unwrap_or(CreatedApiKey {
                    id: "key-id-1".to_string(),
                    key: "secret-1".to_string(),
                }))
        }

        async fn delete_api_key(&self, key_id: &str) -> Result<(), SecretsError> {
            self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.inner.delete_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(msg) = self.inner.delete_failure.lock().clone() {
                return Err(SecretsError::Revocation(msg));
            }
            self.inner.deleted.lock().push(key_id.to_string());
            Ok(())
        }
    }

    /// Config store over fresh in-memory storage, already configured
    pub fn configured_store() -> ConfigStore {
        let store = ConfigStore::new(Arc::new(MemoryStorage::new()));
        store
            .write(
                ConfigUpdate {
                    api_key: Some("admin-api-key".to_string()),
                    app_key: Some("admin-app-key".to_string()),
                    host: Some("https://api.datadoghq.com".to_string()),
                },
                true,
            )
            .unwrap();
        store
    }

    /// Client cache whose builder hands out clones of `mock`
    pub fn mock_cache(mock: &MockKeyManagement) -> ClientCache<MockKeyManagement> {
        let mock = mock.clone();
        ClientCache::new(configured_store(), Box::new(move |_| Ok(mock.clone())))
    }
}
