//! Security event audit logging.
//!
//! Credential lifecycle events are emitted as structured `tracing` events
//! under the `crm_auth::audit` target:
//!
//! - issuance
//! - rejected validations, with the internal reason
//! - revocations
//! - session binding mismatches
//! - expiry sweeps
//!
//! Credential ids are logged as a short SHA-256 fingerprint. Opaque bearer
//! strings are never logged.

use sha2::{Digest, Sha256};

use crate::config::AuditConfig;
use crate::types::{ClientContext, CredentialRecord, CredentialState, CredentialTag};

/// Target used for every audit event.
pub const AUDIT_TARGET: &str = "crm_auth::audit";

/// Short, non-reversible fingerprint of a credential id for logs.
#[must_use]
pub fn fingerprint(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    hex::encode(&digest[..6])
}

/// Why a validation was rejected. Never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not decodable or failed authentication.
    Malformed,
    /// No record under the sealed id.
    NotFound,
    /// Record exists but is expired.
    Expired,
    /// Record exists but was revoked.
    Revoked,
    /// Token presented where a session was expected, or vice versa.
    KindMismatch,
    /// Session presented from a different client context under strict binding.
    BindingMismatch,
    /// The store failed during lookup.
    StoreUnavailable,
}

impl RejectReason {
    /// Returns the reason as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::KindMismatch => "kind_mismatch",
            Self::BindingMismatch => "binding_mismatch",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl From<CredentialState> for RejectReason {
    fn from(state: CredentialState) -> Self {
        match state {
            CredentialState::Revoked => Self::Revoked,
            // An active record that failed `touch` expired in between.
            CredentialState::Expired | CredentialState::Active => Self::Expired,
        }
    }
}

/// Auditable credential lifecycle events.
#[derive(Debug, Clone, Copy)]
pub enum AuditEvent<'a> {
    /// A credential was minted.
    Issued {
        /// The stored record.
        record: &'a CredentialRecord,
    },
    /// A validation attempt failed.
    Rejected {
        /// Internal reason.
        reason: RejectReason,
        /// Id from the sealed claims, when they could be opened.
        id: Option<&'a str>,
    },
    /// A credential was revoked.
    Revoked {
        /// Record id.
        id: &'a str,
        /// Whether the credential was live when revoked.
        was_live: bool,
    },
    /// A session was presented from a context other than the recorded one.
    BindingMismatch {
        /// Record id.
        id: &'a str,
        /// Context recorded at issuance.
        recorded: &'a ClientContext,
        /// Context presented with the request.
        presented: &'a ClientContext,
        /// Whether the mismatch invalidated the session.
        enforced: bool,
    },
    /// Expired records were swept.
    Swept {
        /// Number of records removed.
        removed: u64,
    },
}

/// Emits [`AuditEvent`]s according to [`AuditConfig`].
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    config: AuditConfig,
}

impl AuditLog {
    /// Creates an audit log with the given switches.
    #[must_use]
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Returns `true` if rejected validations are logged.
    #[must_use]
    pub fn logs_failed_validation(&self) -> bool {
        self.config.log_failed_validation
    }

    /// Records an event.
    pub fn record(&self, event: AuditEvent<'_>) {
        match event {
            AuditEvent::Issued { record } => {
                if self.config.log_token_operations {
                    tracing::info!(
                        target: AUDIT_TARGET,
                        event = "issued",
                        kind = %record.tag(),
                        credential = %fingerprint(&record.id),
                        owner = %record.owner,
                        expires_at = %record.expires_at,
                        "Credential issued"
                    );
                }
            }
            AuditEvent::Rejected { reason, id } => {
                if self.config.log_failed_validation {
                    let credential = id.map(fingerprint).unwrap_or_else(|| "-".to_string());
                    tracing::info!(
                        target: AUDIT_TARGET,
                        event = "rejected",
                        reason = reason.as_str(),
                        credential = %credential,
                        "Credential rejected"
                    );
                }
            }
            AuditEvent::Revoked { id, was_live } => {
                if self.config.log_token_operations {
                    tracing::info!(
                        target: AUDIT_TARGET,
                        event = "revoked",
                        credential = %fingerprint(id),
                        was_live,
                        "Credential revoked"
                    );
                }
            }
            AuditEvent::BindingMismatch {
                id,
                recorded,
                presented,
                enforced,
            } => {
                if self.config.log_binding_mismatch {
                    tracing::warn!(
                        target: AUDIT_TARGET,
                        event = "binding_mismatch",
                        kind = %CredentialTag::Session,
                        credential = %fingerprint(id),
                        recorded_address = ?recorded.address,
                        presented_address = ?presented.address,
                        client_changed = recorded.client != presented.client,
                        enforced,
                        "Suspicious session use from a different client context"
                    );
                }
            }
            AuditEvent::Swept { removed } => {
                if self.config.log_token_operations && removed > 0 {
                    tracing::debug!(
                        target: AUDIT_TARGET,
                        event = "swept",
                        removed,
                        "Expired credentials swept"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = fingerprint("credential-id");
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint("credential-id"));
        assert_ne!(a, fingerprint("credential-id2"));
        assert!(!a.contains("credential"));
    }

    #[test]
    fn test_reject_reason_from_state() {
        assert_eq!(
            RejectReason::from(CredentialState::Revoked),
            RejectReason::Revoked
        );
        assert_eq!(
            RejectReason::from(CredentialState::Expired),
            RejectReason::Expired
        );
        assert_eq!(RejectReason::BindingMismatch.as_str(), "binding_mismatch");
    }

    #[test]
    fn test_record_does_not_panic_when_disabled() {
        let log = AuditLog::new(AuditConfig {
            log_token_operations: false,
            log_failed_validation: false,
            log_binding_mismatch: false,
        });
        log.record(AuditEvent::Swept { removed: 3 });
        log.record(AuditEvent::Rejected {
            reason: RejectReason::Malformed,
            id: None,
        });
        assert!(!log.logs_failed_validation());
    }
}
