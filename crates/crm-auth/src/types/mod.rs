//! Shared domain types.
//!
//! - [`CredentialRecord`] - server-side record behind every opaque credential
//! - [`CredentialKind`] - token or session payload
//! - [`ClientContext`] - request context a session is bound to

pub mod credential;

pub use credential::{
    ClientContext, CredentialKind, CredentialRecord, CredentialState, CredentialTag,
};
