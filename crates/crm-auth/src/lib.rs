//! # crm-auth
//!
//! Token, session and PKCE issuance for the CRM backend.
//!
//! This crate provides:
//! - Short-lived bearer tokens carrying an owner and a scope set
//! - Longer-lived session handles bound to the issuing client context
//! - Opaque, authenticated credential strings (AES-256-GCM sealed claims)
//! - Validation and revocation against a pluggable credential store
//! - RFC 7636 PKCE (S256) challenge generation and verification
//! - Audit logging for security events
//!
//! ## Overview
//!
//! Every credential is backed by a [`CredentialRecord`] in a
//! [`CredentialStore`]. The string handed to clients only carries the
//! sealed record id, kind and timestamps; owner, scope and client context
//! stay server-side. Validation fails with a single [`InvalidCredential`]
//! whatever the cause.
//!
//! ## Modules
//!
//! - [`config`] - Lifetimes, binding policy, key source, sweep and audit settings
//! - [`oauth`] - PKCE challenge generation and verification
//! - [`token`] - Claim sealing and bearer token issuance
//! - [`session`] - Session issuance and binding policy
//! - [`validator`] - Validation and revocation
//! - [`service`] - Facade wiring store, cipher, clock and audit together
//! - [`storage`] - Credential store trait and in-memory backend
//! - [`audit`] - Security event audit logging

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod oauth;
pub mod random;
pub mod service;
pub mod session;
pub mod storage;
pub mod sweeper;
pub mod token;
pub mod types;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory, InvalidCredential};
pub use oauth::{PkceCredential, generate_challenge, verify_challenge, verify_pair};
pub use service::{CredentialService, CredentialServiceBuilder};
pub use session::{BindingPolicy, SessionIssuer};
pub use storage::{CredentialStore, DynCredentialStore, InMemoryCredentialStore};
pub use sweeper::spawn_sweeper;
pub use token::{ClaimCipher, EncryptionKey, IssuedCredential, KeySource, TokenIssuer};
pub use types::{ClientContext, CredentialKind, CredentialRecord, CredentialState, CredentialTag};
pub use validator::Validator;

/// Type alias for credential service results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use crm_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory, InvalidCredential};
    pub use crate::oauth::{
        PkceChallenge, PkceChallengeMethod, PkceCredential, PkceError, PkceVerifier,
        generate_challenge, verify_challenge, verify_pair,
    };
    pub use crate::service::CredentialService;
    pub use crate::session::BindingPolicy;
    pub use crate::storage::{CredentialStore, DynCredentialStore, InMemoryCredentialStore};
    pub use crate::token::{EncryptionKey, IssuedCredential};
    pub use crate::types::{ClientContext, CredentialRecord, CredentialState, CredentialTag};
}
