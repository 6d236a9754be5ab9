//! Datadog backend configuration storage
//!
//! A single configuration record (admin API key, application key, host) lives
//! at a fixed storage path. Writes merge partial input into the existing
//! record; the create path requires all three fields.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::storage::{StorageBackend, StorageError};

use super::error::SecretsError;

/// Fixed storage path of the configuration record
pub const CONFIG_STORAGE_PATH: &str = "config";

/// Persisted Datadog admin configuration
///
/// A read before the first write yields the all-empty record; callers must
/// treat empty fields as "not configured" (see [`DatadogConfig::is_configured`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatadogConfig {
    /// Admin API key used to authenticate against the Datadog API
    #[serde(default)]
    pub api_key: String,

    /// Admin application key used to authenticate against the Datadog API
    #[serde(default)]
    pub app_key: String,

    /// Datadog API host, e.g. `api.datadoghq.com`
    #[serde(default)]
    pub host: String,
}

impl DatadogConfig {
    /// Whether a complete configuration has been persisted
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.app_key.is_empty() && !self.host.is_empty()
    }

    /// Short SHA-256 fingerprint of the admin API key, safe to log
    pub fn api_key_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.api_key.as_bytes());
        hex::encode(hasher.finalize())[..12].to_string()
    }
}

/// Partial configuration update
///
/// Absent fields keep their stored value on update; on create the required
/// fields must all be present.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub api_key: Option<String>,
    pub app_key: Option<String>,
    pub host: Option<String>,
}

/// CRUD access to the singleton configuration record
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn StorageBackend>,
}

impl ConfigStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Read the persisted configuration
    ///
    /// Returns the zero-value record if nothing was ever written.
    pub fn read(&self) -> Result<DatadogConfig, SecretsError> {
        match self.storage.get(CONFIG_STORAGE_PATH)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                SecretsError::Storage(StorageError::Decode(format!(
                    "error reading root configuration: {}",
                    e
                )))
            }),
            None => Ok(DatadogConfig::default()),
        }
    }

    /// Whether a configuration record has been persisted
    pub fn exists(&self) -> Result<bool, SecretsError> {
        Ok(self.storage.get(CONFIG_STORAGE_PATH)?.is_some())
    }

    /// Merge `update` into the stored record and persist it
    ///
    /// `is_create` switches on the create path: all three fields are then
    /// required and must be non-empty. Updates may carry any subset; empty
    /// values are rejected so a persisted record never loses a field.
    pub fn write(&self, update: ConfigUpdate, is_create: bool) -> Result<(), SecretsError> {
        let mut config = if is_create {
            DatadogConfig::default()
        } else {
            self.read()?
        };

        merge_field(&mut config.api_key, update.api_key, "datadog_api_key", is_create)?;
        merge_field(&mut config.app_key, update.app_key, "datadog_app_key", is_create)?;
        merge_field(&mut config.host, update.host, "host", is_create)?;

        let bytes = serde_json::to_vec(&config)
            .map_err(|e| SecretsError::Storage(StorageError::Encode(e.to_string())))?;
        self.storage.put(CONFIG_STORAGE_PATH, &bytes)?;
        Ok(())
    }

    /// Remove the configuration record
    pub fn delete(&self) -> Result<(), SecretsError> {
        self.storage.delete(CONFIG_STORAGE_PATH)?;
        Ok(())
    }
}

fn merge_field(
    slot: &mut String,
    value: Option<String>,
    field: &str,
    is_create: bool,
) -> Result<(), SecretsError> {
    match value {
        Some(v) if v.is_empty() => Err(SecretsError::Validation(format!(
            "{} must not be empty",
            field
        ))),
        Some(v) => {
            *slot = v;
            Ok(())
        }
        None if is_create => Err(SecretsError::Validation(format!(
            "missing {} in configuration",
            field
        ))),
        None => Ok(()),
    }
}
