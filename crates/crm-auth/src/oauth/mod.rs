//! OAuth 2.0 support used during the authorization-code exchange.
//!
//! - [`pkce`] - PKCE challenge/verifier generation and verification

pub mod pkce;

pub use pkce::{
    PkceChallenge, PkceChallengeMethod, PkceCredential, PkceError, PkceVerifier,
    generate_challenge, verify_challenge, verify_pair,
};
