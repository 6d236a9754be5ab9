//! Lease bookkeeping for issued credentials
//!
//! Every issued credential is tracked as a lease until it is revoked. The
//! registry drives the per-lease state machine:
//!
//! ```text
//! ISSUED -> REVOKING -> REVOKED (record dropped)
//!                    -> REVOCATION_FAILED (terminal, kept, no automatic retry)
//! ```
//!
//! A revocation aborted by shutdown restores ISSUED so no partial state is
//! left behind. The intentionally short TTLs fit a rotation-oriented
//! credential rather than a long-lived one.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::error::SecretsError;
use super::issuer::IssuedCredential;

/// Lease duration attached to every issued credential
pub const LEASE_TTL: Duration = Duration::from_secs(5);
/// Upper bound on the lease duration
pub const LEASE_MAX_TTL: Duration = Duration::from_secs(10);

/// Lease lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    Issued,
    Revoking,
    Revoked,
    RevocationFailed,
}

/// One tracked lease
///
/// `key_id` is internal lease metadata: it exists only so the key can be
/// revoked and is never serialized into responses.
#[derive(Debug, Clone, Serialize)]
pub struct LeaseRecord {
    pub lease_id: String,
    #[serde(skip_serializing)]
    pub key_id: String,
    /// Requested credential name from the issue path (informational)
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub max_ttl_secs: u64,
    pub state: LeaseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl LeaseRecord {
    /// Instant after which the lease is due for revocation
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + chrono::Duration::seconds(self.ttl_secs as i64)
    }
}

/// In-memory registry of live leases
#[derive(Default)]
pub struct LeaseRegistry {
    leases: Mutex<HashMap<String, LeaseRecord>>,
}

impl LeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach lease metadata to a freshly issued credential
    pub fn register(&self, credential: &IssuedCredential, name: &str) -> LeaseRecord {
        self.register_at(credential, name, Utc::now())
    }

    fn register_at(
        &self,
        credential: &IssuedCredential,
        name: &str,
        issued_at: DateTime<Utc>,
    ) -> LeaseRecord {
        let record = LeaseRecord {
            lease_id: Uuid::new_v4().to_string(),
            key_id: credential.key_id.clone(),
            name: name.to_string(),
            issued_at,
            ttl_secs: LEASE_TTL.as_secs(),
            max_ttl_secs: LEASE_MAX_TTL.as_secs(),
            state: LeaseState::Issued,
            last_error: None,
        };
        self.leases
            .lock()
            .insert(record.lease_id.clone(), record.clone());
        record
    }

    /// Snapshot of all tracked leases, oldest first
    pub fn snapshot(&self) -> Vec<LeaseRecord> {
        let mut records: Vec<LeaseRecord> = self.leases.lock().values().cloned().collect();
        records.sort_by_key(|r| r.issued_at);
        records
    }

    /// Ids of ISSUED leases whose TTL has elapsed at `now`
    pub fn expired_lease_ids(&self, now: DateTime<Utc>) -> Vec<String> {
        self.leases
            .lock()
            .values()
            .filter(|r| r.state == LeaseState::Issued && now >= r.expires_at())
            .map(|r| r.lease_id.clone())
            .collect()
    }

    /// Transition a lease to REVOKING and hand back its key id
    ///
    /// Allowed from ISSUED, and from REVOCATION_FAILED when the caller
    /// explicitly retries; a lease already REVOKING is rejected.
    pub fn begin_revoke(&self, lease_id: &str) -> Result<String, SecretsError> {
        let mut leases = self.leases.lock();
        let record = leases.get_mut(lease_id).ok_or_else(|| {
            SecretsError::Validation(format!("unknown lease_id: {}", lease_id))
        })?;

        match record.state {
            LeaseState::Issued | LeaseState::RevocationFailed => {
                record.state = LeaseState::Revoking;
                Ok(record.key_id.clone())
            }
            LeaseState::Revoking => Err(SecretsError::Validation(format!(
                "revocation already in progress for lease {}",
                lease_id
            ))),
            LeaseState::Revoked => Err(SecretsError::Validation(format!(
                "lease {} is already revoked",
                lease_id
            ))),
        }
    }

    /// Revocation succeeded: the lease is terminal and dropped
    pub fn complete_revoke(&self, lease_id: &str) {
        if let Some(mut record) = self.leases.lock().remove(lease_id) {
            record.state = LeaseState::Revoked;
            tracing::debug!(lease_id = %record.lease_id, state = ?record.state, "lease reached terminal state, dropping record");
        }
    }

    /// Revocation failed: terminal, kept for inspection, never re-swept
    pub fn fail_revoke(&self, lease_id: &str, error: &SecretsError) {
        if let Some(record) = self.leases.lock().get_mut(lease_id) {
            record.state = LeaseState::RevocationFailed;
            record.last_error = Some(error.to_string());
        }
    }

    /// Cancelled mid-revocation: restore ISSUED, leaving no partial state
    pub fn restore_issued(&self, lease_id: &str) {
        if let Some(record) = self.leases.lock().get_mut(lease_id) {
            if record.state == LeaseState::Revoking {
                record.state = LeaseState::Issued;
            }
        }
    }

}
