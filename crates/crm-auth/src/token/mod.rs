//! Bearer token issuance and opaque credential encoding.
//!
//! - [`claims`] - the payload sealed inside every opaque string
//! - [`cipher`] - AES-256-GCM sealing and key loading
//! - [`issuer`] - [`TokenIssuer`] and the shared minting path

pub mod cipher;
pub mod claims;
pub mod issuer;

pub use cipher::{ClaimCipher, DEFAULT_KEY_ENV, EncryptionKey, KEY_SIZE, KeySource};
pub use claims::CredentialClaims;
pub use issuer::{IssuedCredential, TokenIssuer};

pub(crate) use issuer::Authority;
