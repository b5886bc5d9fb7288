//! Credential storage.
//!
//! - [`CredentialStore`] - storage interface for credential records
//! - [`InMemoryCredentialStore`] - process-local default backend
//!
//! A shared backend (for example a key-value database) implements the same
//! trait to let several service instances validate each other's credentials.

pub mod credential;
pub mod memory;

pub use credential::{CredentialStore, DynCredentialStore};
pub use memory::InMemoryCredentialStore;
