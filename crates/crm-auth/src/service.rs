//! Credential service facade.
//!
//! Owns the store, the claim cipher, the clock and the audit log, and wires
//! them into the [`TokenIssuer`], [`SessionIssuer`] and [`Validator`].
//!
//! # Usage
//!
//! ```ignore
//! use crm_auth::prelude::*;
//!
//! let service = Arc::new(CredentialService::from_config(AuthConfig::default())?);
//! let _sweeper = service.start_sweeper();
//!
//! let issued = service.issue_token("u1", ["read"], Duration::minutes(15)).await?;
//! let record = service.validate(issued.as_str()).await?;
//! ```

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::task::JoinHandle;

use crate::AuthResult;
use crate::audit::{AuditEvent, AuditLog, fingerprint};
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, InvalidCredential};
use crate::session::{BindingPolicy, SessionIssuer};
use crate::storage::{DynCredentialStore, InMemoryCredentialStore};
use crate::sweeper::spawn_sweeper;
use crate::token::{Authority, ClaimCipher, EncryptionKey, IssuedCredential, TokenIssuer};
use crate::types::{ClientContext, CredentialRecord};
use crate::validator::Validator;

/// Issues, validates and revokes tokens and sessions.
pub struct CredentialService {
    config: AuthConfig,
    store: DynCredentialStore,
    clock: Arc<dyn Clock>,
    audit: AuditLog,
    tokens: TokenIssuer,
    sessions: SessionIssuer,
    validator: Validator,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CredentialService`].
pub struct CredentialServiceBuilder {
    config: AuthConfig,
    store: Option<DynCredentialStore>,
    key: Option<EncryptionKey>,
    clock: Option<Arc<dyn Clock>>,
}

impl CredentialServiceBuilder {
    /// Uses the given store instead of a fresh in-memory one.
    #[must_use]
    pub fn store(mut self, store: DynCredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses the given key instead of resolving one from `secret.key_env`.
    #[must_use]
    pub fn key(mut self, key: EncryptionKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Uses the given clock instead of the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the configuration and builds the service.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the configuration is invalid or
    /// the key cannot be resolved, and `AuthError::RandomnessUnavailable` if
    /// an ephemeral key cannot be generated.
    pub fn build(self) -> AuthResult<CredentialService> {
        let config = self.config;
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let token_ttl = to_time(config.token.default_ttl, "token.default_ttl")?;
        let token_max = to_time(config.token.max_ttl, "token.max_ttl")?;
        let session_ttl = to_time(config.session.ttl, "session.ttl")?;
        let session_max = to_time(config.session.max_ttl, "session.max_ttl")?;

        let key = match self.key {
            Some(key) => key,
            None => EncryptionKey::from_config(&config.secret)?,
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::new()) as DynCredentialStore);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let audit = AuditLog::new(config.audit.clone());
        let binding = BindingPolicy::from_strict(config.session.strict_binding);

        let authority = Authority {
            store: Arc::clone(&store),
            cipher: Arc::new(ClaimCipher::new(&key)),
            clock: Arc::clone(&clock),
            audit: audit.clone(),
        };

        tracing::info!(
            key_source = ?key.source(),
            binding = ?binding,
            token_ttl = %token_ttl,
            session_ttl = %session_ttl,
            "Credential service initialized"
        );

        Ok(CredentialService {
            tokens: TokenIssuer::new(authority.clone(), token_ttl, token_max),
            sessions: SessionIssuer::new(authority.clone(), session_ttl, session_max),
            validator: Validator::new(authority, binding),
            config,
            store,
            clock,
            audit,
        })
    }
}

fn to_time(duration: std::time::Duration, field: &str) -> AuthResult<Duration> {
    Duration::try_from(duration)
        .map_err(|e| AuthError::configuration(format!("{field} out of range: {e}")))
}

impl CredentialService {
    /// Starts building a service from `config`.
    #[must_use]
    pub fn builder(config: AuthConfig) -> CredentialServiceBuilder {
        CredentialServiceBuilder {
            config,
            store: None,
            key: None,
            clock: None,
        }
    }

    /// Builds a service with an in-memory store, the system clock and the
    /// key named by `secret.key_env`.
    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        Self::builder(config).build()
    }

    // ---- issuance ----

    /// Issues a bearer token. See [`TokenIssuer::issue`].
    pub async fn issue_token<I, S>(
        &self,
        owner: impl Into<String>,
        scope: I,
        ttl: Duration,
    ) -> AuthResult<IssuedCredential>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.issue(owner, scope, ttl).await
    }

    /// Issues a session handle. See [`SessionIssuer::issue`].
    pub async fn issue_session(
        &self,
        owner: impl Into<String>,
        context: ClientContext,
        ttl: Option<Duration>,
    ) -> AuthResult<IssuedCredential> {
        self.sessions.issue(owner, context, ttl).await
    }

    // ---- validation ----

    /// Validates a credential without a client context. See
    /// [`Validator::validate`].
    pub async fn validate(&self, opaque: &str) -> Result<CredentialRecord, InvalidCredential> {
        self.validator.validate(opaque).await
    }

    /// Validates a bearer token.
    pub async fn validate_token(
        &self,
        opaque: &str,
    ) -> Result<CredentialRecord, InvalidCredential> {
        self.validator.validate_token(opaque).await
    }

    /// Validates a session presented from `presented`.
    pub async fn validate_session(
        &self,
        opaque: &str,
        presented: &ClientContext,
    ) -> Result<CredentialRecord, InvalidCredential> {
        self.validator.validate_session(opaque, presented).await
    }

    // ---- revocation and maintenance ----

    /// Revokes the credential behind an opaque string.
    pub async fn revoke(&self, opaque: &str) -> bool {
        self.validator.revoke(opaque).await
    }

    /// Revokes a credential by record id.
    pub async fn revoke_by_id(&self, id: &str) -> AuthResult<bool> {
        self.validator.revoke_by_id(id).await
    }

    /// Removes a record outright, whatever its state.
    pub async fn purge(&self, id: &str) -> AuthResult<CredentialRecord> {
        let record = self.store.delete(id).await?;
        tracing::debug!(credential = %fingerprint(id), "Credential purged");
        Ok(record)
    }

    /// Removes every record that expired before now.
    pub async fn sweep_expired(&self) -> AuthResult<u64> {
        let removed = self.store.sweep_expired(self.now()).await?;
        self.audit.record(AuditEvent::Swept { removed });
        Ok(removed)
    }

    /// Spawns the background sweeper if `sweep.enabled` is set.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.sweep.enabled {
            tracing::debug!("Credential sweeper disabled");
            return None;
        }
        Some(spawn_sweeper(Arc::clone(self), self.config.sweep.interval))
    }

    // ---- accessors ----

    /// The token issuer.
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// The session issuer.
    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// The validator.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The backing store.
    pub fn store(&self) -> &DynCredentialStore {
        &self.store
    }

    /// The configuration the service was built from.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Current time according to the service clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}
