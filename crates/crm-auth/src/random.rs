//! Secure random material for identifiers, keys and PKCE verifiers.
//!
//! Everything is drawn from the operating system CSPRNG. A failing RNG is
//! reported as [`AuthError::RandomnessUnavailable`]; there is no fallback.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::AuthResult;
use crate::error::AuthError;

/// Number of random bytes behind every credential identifier.
pub const ID_BYTES: usize = 32;

/// Fill a fixed-size buffer from the OS random source.
///
/// # Errors
///
/// Returns `AuthError::RandomnessUnavailable` if the OS RNG fails.
pub fn random_bytes<const N: usize>() -> AuthResult<[u8; N]> {
    let mut buf = [0u8; N];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        tracing::error!(error = %e, "OS random source failed");
        AuthError::randomness_unavailable(e.to_string())
    })?;
    Ok(buf)
}

/// Generate a fresh credential identifier.
///
/// 32 random bytes encoded as base64url without padding (43 characters).
pub fn generate_id() -> AuthResult<String> {
    let bytes = random_bytes::<ID_BYTES>()?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id().unwrap();
        assert_eq!(id.len(), 43);
        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..1_000).map(|_| generate_id().unwrap()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_random_bytes_len() {
        let bytes = random_bytes::<12>().unwrap();
        assert_eq!(bytes.len(), 12);
    }
}
