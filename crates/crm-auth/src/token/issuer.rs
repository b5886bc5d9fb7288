//! Bearer token issuance.
//!
//! Tokens and sessions are minted through the same [`Authority`], which
//! checks the lifetime, draws a fresh id, seals the claims and stores the
//! record, in that order. Nothing is stored if any earlier step fails.

use std::collections::BTreeSet;
use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::audit::{AuditEvent, AuditLog, fingerprint};
use crate::clock::Clock;
use crate::error::AuthError;
use crate::random::generate_id;
use crate::storage::DynCredentialStore;
use crate::token::cipher::ClaimCipher;
use crate::token::claims::CredentialClaims;
use crate::types::{CredentialKind, CredentialRecord, CredentialTag};

/// Freshly minted credential.
///
/// The opaque value is what the caller hands to the client; the remaining
/// fields are metadata for the issuing code path.
#[derive(Clone)]
pub struct IssuedCredential {
    value: String,

    /// Record id, usable with administrative revocation.
    pub id: String,

    /// Token or session.
    pub kind: CredentialTag,

    /// When the credential was issued.
    pub issued_at: OffsetDateTime,

    /// Last instant at which the credential validates.
    pub expires_at: OffsetDateTime,
}

impl IssuedCredential {
    /// The opaque bearer string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Consumes the credential, returning the opaque bearer string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

impl std::fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("value", &"[REDACTED]")
            .field("id", &fingerprint(&self.id))
            .field("kind", &self.kind)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Shared state of the issuers and the validator.
#[derive(Clone)]
pub(crate) struct Authority {
    pub(crate) store: DynCredentialStore,
    pub(crate) cipher: Arc<ClaimCipher>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) audit: AuditLog,
}

impl Authority {
    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Mints and stores a credential of the given kind.
    pub(crate) async fn mint(
        &self,
        owner: String,
        kind: CredentialKind,
        ttl: Duration,
        max_ttl: Duration,
    ) -> AuthResult<IssuedCredential> {
        if !ttl.is_positive() {
            return Err(AuthError::invalid_ttl(format!(
                "ttl must be positive, got {ttl}"
            )));
        }
        if ttl > max_ttl {
            return Err(AuthError::invalid_ttl(format!(
                "ttl {ttl} exceeds maximum {max_ttl}"
            )));
        }

        let issued_at = self.now();
        let expires_at = issued_at
            .checked_add(ttl)
            .ok_or_else(|| AuthError::invalid_ttl(format!("ttl {ttl} overflows the clock")))?;

        let id = generate_id()?;
        let record = CredentialRecord::new(id, owner, kind, issued_at, expires_at);
        let value = self.cipher.seal(&CredentialClaims::for_record(&record))?;

        let tag = record.tag();
        let id = record.id.clone();
        if let Err(e) = self.store.put(record.clone()).await {
            if matches!(e, AuthError::DuplicateId { .. }) {
                tracing::error!(
                    kind = %tag,
                    error = %e,
                    "Credential id collision, refusing to issue"
                );
            }
            return Err(e);
        }

        self.audit.record(AuditEvent::Issued { record: &record });
        tracing::debug!(kind = %tag, credential = %fingerprint(&id), "Credential issued");

        Ok(IssuedCredential {
            value,
            id,
            kind: tag,
            issued_at,
            expires_at,
        })
    }
}

/// Issues short-lived bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    authority: Authority,
    default_ttl: Duration,
    max_ttl: Duration,
}

impl TokenIssuer {
    pub(crate) fn new(authority: Authority, default_ttl: Duration, max_ttl: Duration) -> Self {
        Self {
            authority,
            default_ttl,
            max_ttl,
        }
    }

    /// Issues a token for `owner` granting `scope`, valid for `ttl`.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidTtl` if `ttl` is not positive or exceeds the
    ///   configured maximum. Nothing is stored.
    /// - `AuthError::RandomnessUnavailable` if no id or nonce can be drawn.
    /// - `AuthError::DuplicateId` if the store already holds the drawn id.
    pub async fn issue<I, S>(
        &self,
        owner: impl Into<String>,
        scope: I,
        ttl: Duration,
    ) -> AuthResult<IssuedCredential>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope: BTreeSet<String> = scope.into_iter().map(Into::into).collect();
        self.authority
            .mint(
                owner.into(),
                CredentialKind::Token { scope },
                ttl,
                self.max_ttl,
            )
            .await
    }

    /// Issues a token with the configured default lifetime.
    pub async fn issue_default<I, S>(
        &self,
        owner: impl Into<String>,
        scope: I,
    ) -> AuthResult<IssuedCredential>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issue(owner, scope, self.default_ttl).await
    }

    /// Lifetime used by [`issue_default`](Self::issue_default).
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Longest lifetime accepted by [`issue`](Self::issue).
    #[must_use]
    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }
}
