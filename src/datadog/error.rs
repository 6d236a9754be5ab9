//! Secrets engine error types

use std::fmt;

use crate::storage::StorageError;

/// Secrets engine error taxonomy
///
/// Every component-level failure is wrapped with its operation context and
/// surfaced unchanged to the caller; there is no local recovery or retry.
#[derive(Debug)]
pub enum SecretsError {
    /// Missing or malformed caller input
    Validation(String),

    /// No Datadog configuration has been persisted yet
    ConfigurationMissing,

    /// A client handle could not be built from the stored configuration
    ClientConstruction(String),

    /// The external create-key call failed
    Issuance(String),

    /// The external delete-key call failed
    Revocation(String),

    /// The external API returned incomplete data (contract bug, not retried)
    InvariantViolation(String),

    /// Durable store failure
    Storage(StorageError),

    /// Operation aborted by caller-driven cancellation
    Cancelled(String),
}

impl fmt::Display for SecretsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretsError::Validation(msg) => write!(f, "invalid request: {}", msg),
            SecretsError::ConfigurationMissing => {
                write!(f, "Datadog backend is not configured")
            }
            SecretsError::ClientConstruction(msg) => {
                write!(f, "error creating Datadog client: {}", msg)
            }
            SecretsError::Issuance(msg) => write!(f, "error creating Datadog API key: {}", msg),
            SecretsError::Revocation(msg) => write!(f, "error revoking Datadog API key: {}", msg),
            SecretsError::InvariantViolation(msg) => write!(f, "invariant violation: {}", msg),
            SecretsError::Storage(err) => write!(f, "{}", err),
            SecretsError::Cancelled(msg) => write!(f, "operation cancelled: {}", msg),
        }
    }
}

impl std::error::Error for SecretsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecretsError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for SecretsError {
    fn from(err: StorageError) -> Self {
        SecretsError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_operation_context() {
        let err = SecretsError::Issuance("403 Forbidden".to_string());
        assert!(err.to_string().contains("creating Datadog API key"));
        assert!(err.to_string().contains("403 Forbidden"));
    }

    #[test]
    fn test_storage_error_is_source() {
        use std::error::Error;
        let err = SecretsError::from(StorageError::Io("disk full".to_string()));
        assert!(err.source().is_some());
    }
}
