//! Session handle issuance and client binding.

use time::Duration;

use crate::AuthResult;
use crate::token::{Authority, IssuedCredential};
use crate::types::{ClientContext, CredentialKind};

/// What to do when a session is presented from a context other than the
/// one it was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPolicy {
    /// Reject the session.
    #[default]
    Strict,
    /// Log the mismatch and accept the session.
    Soft,
}

impl BindingPolicy {
    /// Maps the `session.strict_binding` switch to a policy.
    #[must_use]
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Soft }
    }

    /// Returns `true` if mismatches invalidate the session.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Issues session handles bound to a [`ClientContext`].
#[derive(Clone)]
pub struct SessionIssuer {
    authority: Authority,
    default_ttl: Duration,
    max_ttl: Duration,
}

impl SessionIssuer {
    pub(crate) fn new(authority: Authority, default_ttl: Duration, max_ttl: Duration) -> Self {
        Self {
            authority,
            default_ttl,
            max_ttl,
        }
    }

    /// Issues a session for `owner` bound to `context`.
    ///
    /// `ttl` defaults to the configured session lifetime.
    ///
    /// # Errors
    ///
    /// Same as [`TokenIssuer::issue`](crate::token::TokenIssuer::issue).
    pub async fn issue(
        &self,
        owner: impl Into<String>,
        context: ClientContext,
        ttl: Option<Duration>,
    ) -> AuthResult<IssuedCredential> {
        self.authority
            .mint(
                owner.into(),
                CredentialKind::Session { context },
                ttl.unwrap_or(self.default_ttl),
                self.max_ttl,
            )
            .await
    }

    /// Lifetime used when none is given.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
