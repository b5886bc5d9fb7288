//! Credential validation and revocation.
//!
//! Every validation failure collapses to [`InvalidCredential`]. The internal
//! reason (malformed, unknown, expired, revoked, wrong kind, binding
//! mismatch) only reaches the audit log.

use crate::AuthResult;
use crate::audit::{AuditEvent, RejectReason, fingerprint};
use crate::error::{AuthError, InvalidCredential};
use crate::session::BindingPolicy;
use crate::token::Authority;
use crate::types::{ClientContext, CredentialRecord, CredentialTag};

/// Validates and revokes opaque credentials.
#[derive(Clone)]
pub struct Validator {
    authority: Authority,
    binding: BindingPolicy,
}

impl Validator {
    pub(crate) fn new(authority: Authority, binding: BindingPolicy) -> Self {
        Self { authority, binding }
    }

    /// The session binding policy in force.
    #[must_use]
    pub fn binding_policy(&self) -> BindingPolicy {
        self.binding
    }

    /// Validates a credential without a client context.
    ///
    /// Under [`BindingPolicy::Strict`] only tokens pass, since a session
    /// cannot be checked against its binding here; use
    /// [`validate_session`](Self::validate_session) for those. Under
    /// [`BindingPolicy::Soft`] either kind is accepted.
    pub async fn validate(&self, opaque: &str) -> Result<CredentialRecord, InvalidCredential> {
        let expected = if self.binding.is_strict() {
            Some(CredentialTag::Token)
        } else {
            None
        };
        self.lookup(opaque, expected).await
    }

    /// Validates a bearer token. Sessions are rejected.
    pub async fn validate_token(
        &self,
        opaque: &str,
    ) -> Result<CredentialRecord, InvalidCredential> {
        self.lookup(opaque, Some(CredentialTag::Token)).await
    }

    /// Validates a session presented from `presented`.
    ///
    /// A context mismatch is always audited. Under [`BindingPolicy::Strict`]
    /// it also invalidates the session.
    pub async fn validate_session(
        &self,
        opaque: &str,
        presented: &ClientContext,
    ) -> Result<CredentialRecord, InvalidCredential> {
        let record = self.lookup(opaque, Some(CredentialTag::Session)).await?;

        let Some(recorded) = record.client_context() else {
            self.reject(RejectReason::KindMismatch, Some(&record.id));
            return Err(InvalidCredential);
        };

        if !recorded.matches(presented) {
            let enforced = self.binding.is_strict();
            self.authority.audit.record(AuditEvent::BindingMismatch {
                id: &record.id,
                recorded,
                presented,
                enforced,
            });
            if enforced {
                self.reject(RejectReason::BindingMismatch, Some(&record.id));
                return Err(InvalidCredential);
            }
        }

        Ok(record)
    }

    /// Revokes the credential behind an opaque string.
    ///
    /// Returns `true` if it was live immediately before this call. Unknown,
    /// malformed and already revoked or expired credentials return `false`.
    pub async fn revoke(&self, opaque: &str) -> bool {
        let Ok(claims) = self.authority.cipher.open(opaque) else {
            return false;
        };
        match self.revoke_by_id(&claims.id).await {
            Ok(was_live) => was_live,
            Err(AuthError::NotFound) => false,
            Err(e) => {
                tracing::warn!(
                    credential = %fingerprint(&claims.id),
                    error = %e,
                    "Credential revocation failed"
                );
                false
            }
        }
    }

    /// Revokes a credential by record id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no record has this id, or the store
    /// error if the store fails.
    pub async fn revoke_by_id(&self, id: &str) -> AuthResult<bool> {
        let was_live = self.authority.store.revoke(id, self.authority.now()).await?;
        self.authority
            .audit
            .record(AuditEvent::Revoked { id, was_live });
        Ok(was_live)
    }

    async fn lookup(
        &self,
        opaque: &str,
        expected: Option<CredentialTag>,
    ) -> Result<CredentialRecord, InvalidCredential> {
        let claims = match self.authority.cipher.open(opaque) {
            Ok(claims) => claims,
            Err(e) => {
                self.reject(RejectReason::Malformed, None);
                return Err(e);
            }
        };

        if expected.is_some_and(|tag| tag != claims.kind) {
            self.reject(RejectReason::KindMismatch, Some(&claims.id));
            return Err(InvalidCredential);
        }

        let now = self.authority.now();
        if claims.is_stale_at(now.unix_timestamp()) {
            self.reject(RejectReason::Expired, Some(&claims.id));
            return Err(InvalidCredential);
        }

        let record = match self.authority.store.touch(&claims.id, now).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                if self.authority.audit.logs_failed_validation() {
                    let reason = match self.authority.store.get(&claims.id).await {
                        Ok(record) => RejectReason::from(record.state_at(now)),
                        Err(_) => RejectReason::NotFound,
                    };
                    self.reject(reason, Some(&claims.id));
                }
                return Err(InvalidCredential);
            }
            Err(e) => {
                tracing::warn!(
                    credential = %fingerprint(&claims.id),
                    error = %e,
                    "Credential store lookup failed"
                );
                self.reject(RejectReason::StoreUnavailable, Some(&claims.id));
                return Err(InvalidCredential);
            }
        };

        if record.tag() != claims.kind {
            self.reject(RejectReason::KindMismatch, Some(&claims.id));
            return Err(InvalidCredential);
        }

        tracing::debug!(
            kind = %claims.kind,
            credential = %fingerprint(&claims.id),
            "Credential validated"
        );
        Ok(record)
    }

    fn reject(&self, reason: RejectReason, id: Option<&str>) {
        self.authority
            .audit
            .record(AuditEvent::Rejected { reason, id });
    }
}
