//! Credential record domain type.
//!
//! A `CredentialRecord` is the authoritative server-side state behind an
//! opaque bearer string. Tokens and sessions share the record shape and
//! differ only in their [`CredentialKind`] payload.
//!
//! # Lifecycle
//!
//! `Active -> Expired` happens when the clock passes `expires_at`;
//! `Active -> Revoked` happens on explicit revocation. Both are terminal.
//! A record is live while `now <= expires_at`.

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Discriminant of a [`CredentialKind`], carried inside the sealed claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialTag {
    /// Short-lived bearer token.
    Token,
    /// Longer-lived session handle.
    Session,
}

impl CredentialTag {
    /// Returns the tag as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Session => "session",
        }
    }
}

impl std::fmt::Display for CredentialTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request context a session was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    /// Originating network address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddr>,
    /// Client descriptor (typically the User-Agent).
    pub client: String,
}

impl ClientContext {
    /// Creates a new client context.
    #[must_use]
    pub fn new(address: Option<IpAddr>, client: impl Into<String>) -> Self {
        Self {
            address,
            client: client.into(),
        }
    }

    /// Returns `true` if `other` presents the same address and descriptor.
    #[must_use]
    pub fn matches(&self, other: &ClientContext) -> bool {
        self.address == other.address && self.client == other.client
    }
}

/// Kind-specific payload of a credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialKind {
    /// Bearer token with its granted scopes.
    Token {
        /// Granted scopes.
        scope: BTreeSet<String>,
    },
    /// Session bound to the context it was issued in.
    Session {
        /// Context recorded at issuance.
        context: ClientContext,
    },
}

impl CredentialKind {
    /// Returns the discriminant of this kind.
    #[must_use]
    pub fn tag(&self) -> CredentialTag {
        match self {
            Self::Token { .. } => CredentialTag::Token,
            Self::Session { .. } => CredentialTag::Session,
        }
    }
}

/// Point-in-time state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialState {
    /// Validates successfully.
    Active,
    /// Past `expires_at`.
    Expired,
    /// Explicitly revoked. Reported in preference to `Expired`.
    Revoked,
}

/// Credential record held by a [`CredentialStore`](crate::storage::CredentialStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Opaque random identifier (base64url, 43 characters).
    pub id: String,

    /// Subject the credential was issued to.
    pub owner: String,

    /// When the credential was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    /// Last instant at which the credential is still valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Token or session payload.
    pub kind: CredentialKind,

    /// Monotonic revocation flag.
    pub revoked: bool,

    /// When the credential was revoked.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,

    /// Last successful validation (tokens only).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub last_used_at: Option<OffsetDateTime>,
}

impl CredentialRecord {
    /// Creates an active record.
    #[must_use]
    pub fn new(
        id: String,
        owner: String,
        kind: CredentialKind,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Self {
        debug_assert!(expires_at > issued_at);
        Self {
            id,
            owner,
            issued_at,
            expires_at,
            kind,
            revoked: false,
            revoked_at: None,
            last_used_at: None,
        }
    }

    /// Returns the discriminant of this record's kind.
    #[must_use]
    pub fn tag(&self) -> CredentialTag {
        self.kind.tag()
    }

    /// Returns `true` if `now` is past `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Returns `true` if this record has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Returns `true` if this record would validate at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }

    /// Returns the state of this record at `now`.
    #[must_use]
    pub fn state_at(&self, now: OffsetDateTime) -> CredentialState {
        if self.revoked {
            CredentialState::Revoked
        } else if self.is_expired_at(now) {
            CredentialState::Expired
        } else {
            CredentialState::Active
        }
    }

    /// Granted scopes, for tokens.
    #[must_use]
    pub fn scope(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            CredentialKind::Token { scope } => Some(scope),
            CredentialKind::Session { .. } => None,
        }
    }

    /// Returns `true` if this is a token granting `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope().is_some_and(|s| s.contains(scope))
    }

    /// Recorded client context, for sessions.
    #[must_use]
    pub fn client_context(&self) -> Option<&ClientContext> {
        match &self.kind {
            CredentialKind::Session { context } => Some(context),
            CredentialKind::Token { .. } => None,
        }
    }

    /// Flags the record revoked. Returns `true` if this call flipped the flag.
    pub fn mark_revoked(&mut self, now: OffsetDateTime) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revoked_at = Some(now);
        true
    }

    /// Records a successful validation. Sessions do not track usage.
    pub fn mark_used(&mut self, now: OffsetDateTime) {
        if matches!(self.kind, CredentialKind::Token { .. }) {
            self.last_used_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn token(issued_at: OffsetDateTime, ttl: Duration) -> CredentialRecord {
        CredentialRecord::new(
            "id-1".to_string(),
            "u1".to_string(),
            CredentialKind::Token {
                scope: BTreeSet::from(["read".to_string()]),
            },
            issued_at,
            issued_at + ttl,
        )
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let issued = datetime!(2026-03-01 10:00 UTC);
        let record = token(issued, Duration::minutes(15));
        let exp = record.expires_at;

        assert!(record.is_live_at(exp - Duration::seconds(1)));
        assert!(record.is_live_at(exp));
        assert!(!record.is_live_at(exp + Duration::nanoseconds(1)));
        assert_eq!(
            record.state_at(exp + Duration::seconds(1)),
            CredentialState::Expired
        );
    }

    #[test]
    fn test_revocation_is_monotonic() {
        let issued = datetime!(2026-03-01 10:00 UTC);
        let mut record = token(issued, Duration::minutes(15));

        assert!(record.mark_revoked(issued));
        assert!(!record.mark_revoked(issued + Duration::minutes(1)));
        assert_eq!(record.revoked_at, Some(issued));
        assert_eq!(record.state_at(issued), CredentialState::Revoked);
        // Revoked wins over expired.
        assert_eq!(
            record.state_at(issued + Duration::hours(1)),
            CredentialState::Revoked
        );
    }

    #[test]
    fn test_mark_used_only_for_tokens() {
        let issued = datetime!(2026-03-01 10:00 UTC);
        let mut record = token(issued, Duration::minutes(15));
        record.mark_used(issued + Duration::minutes(1));
        assert_eq!(record.last_used_at, Some(issued + Duration::minutes(1)));

        let mut session = CredentialRecord::new(
            "id-2".to_string(),
            "u1".to_string(),
            CredentialKind::Session {
                context: ClientContext::new(None, "curl/8.0"),
            },
            issued,
            issued + Duration::hours(8),
        );
        session.mark_used(issued + Duration::minutes(1));
        assert!(session.last_used_at.is_none());
    }

    #[test]
    fn test_kind_accessors() {
        let issued = datetime!(2026-03-01 10:00 UTC);
        let record = token(issued, Duration::minutes(15));
        assert_eq!(record.tag(), CredentialTag::Token);
        assert!(record.has_scope("read"));
        assert!(!record.has_scope("write"));
        assert!(record.client_context().is_none());
    }

    #[test]
    fn test_client_context_matches() {
        let a = ClientContext::new(Some("10.0.0.1".parse().unwrap()), "Mozilla/5.0");
        let b = ClientContext::new(Some("10.0.0.1".parse().unwrap()), "Mozilla/5.0");
        let c = ClientContext::new(Some("10.0.0.2".parse().unwrap()), "Mozilla/5.0");
        let d = ClientContext::new(Some("10.0.0.1".parse().unwrap()), "curl/8.0");
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert!(!a.matches(&d));
    }

    #[test]
    fn test_record_serde_shape() {
        let issued = datetime!(2026-03-01 10:00 UTC);
        let record = token(issued, Duration::minutes(15));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"]["type"], "token");
        assert_eq!(json["issuedAt"], "2026-03-01T10:00:00Z");
        assert!(json.get("revokedAt").is_none());

        let parsed: CredentialRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
