//! Claims sealed inside every opaque credential string.

use serde::{Deserialize, Serialize};

use crate::types::{CredentialRecord, CredentialTag};

/// Plaintext claims carried by an opaque credential.
///
/// Timestamps are unix seconds, floored. The authoritative expiry is the
/// stored record; `exp` only lets validation reject stale strings without a
/// store lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialClaims {
    /// Record id.
    pub id: String,

    /// Token or session.
    #[serde(rename = "typ")]
    pub kind: CredentialTag,

    /// Issued at.
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expires at.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl CredentialClaims {
    /// Builds the claims for a freshly minted record.
    #[must_use]
    pub fn for_record(record: &CredentialRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.tag(),
            issued_at: record.issued_at.unix_timestamp(),
            expires_at: record.expires_at.unix_timestamp(),
        }
    }

    /// Serializes the claims to their wire form.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parses claims from their wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns `true` if `now` (unix seconds) is past the sealed expiry.
    #[must_use]
    pub fn is_stale_at(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
