//! PKCE (Proof Key for Code Exchange) implementation
//!
//! Implements RFC 7636 with the S256 method only; "plain" is rejected.
//! Challenge comparison is constant-time.
//!
//! # Example
//!
//! ```
//! use crm_auth::oauth::{generate_challenge, verify_challenge};
//!
//! let pkce = generate_challenge().unwrap();
//! assert!(verify_challenge(pkce.verifier.as_str(), pkce.challenge.as_str()));
//! assert!(!verify_challenge("not-the-verifier", pkce.challenge.as_str()));
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::AuthResult;
use crate::random::random_bytes;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during PKCE operations.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be URL-safe ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,

    /// Challenge format is invalid.
    #[error("Invalid challenge format: must be valid base64url")]
    InvalidChallengeFormat,

    /// Unsupported challenge method (only S256 is supported).
    #[error("Unsupported challenge method: {0}. Only S256 is supported.")]
    UnsupportedMethod(String),

    /// PKCE verification failed (verifier doesn't match challenge).
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

impl PkceError {
    /// Returns `true` if this is a verifier validation error.
    #[must_use]
    pub fn is_verifier_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidVerifierLength(_) | Self::InvalidVerifierCharacters
        )
    }

    /// Returns `true` if this is a challenge validation error.
    #[must_use]
    pub fn is_challenge_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidChallengeFormat | Self::UnsupportedMethod(_)
        )
    }

    /// Get the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidVerifierLength(_)
            | Self::InvalidVerifierCharacters
            | Self::InvalidChallengeFormat
            | Self::UnsupportedMethod(_) => "invalid_request",
            Self::VerificationFailed => "invalid_grant",
        }
    }
}

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// PKCE challenge method. Only S256 (SHA-256) is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PkceChallengeMethod {
    /// SHA-256 hash.
    #[default]
    S256,
}

impl PkceChallengeMethod {
    /// Parse challenge method from string.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything but "S256",
    /// including "plain".
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        match method {
            "S256" => Ok(Self::S256),
            "plain" => Err(PkceError::UnsupportedMethod(
                "plain (downgrade not permitted)".to_string(),
            )),
            other => Err(PkceError::UnsupportedMethod(other.to_string())),
        }
    }

    /// Get the method as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// PKCE Verifier
// =============================================================================

/// PKCE code verifier.
///
/// 43-128 characters from `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`
/// (RFC 7636 Section 4.1).
#[derive(Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Create a new verifier from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is not 43-128 or a character falls
    /// outside the unreserved set.
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        let len = verifier.len();
        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }

        Ok(Self(verifier))
    }

    /// Generate a verifier from 32 bytes of OS randomness (43 characters).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RandomnessUnavailable` if the OS RNG fails.
    pub fn generate() -> AuthResult<Self> {
        let bytes = random_bytes::<32>()?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the verifier and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PkceVerifier(<redacted>)")
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// PKCE code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Derive the S256 challenge for a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self(s256(verifier.as_str()))
    }

    /// Create a challenge from a raw string (received from client).
    ///
    /// # Errors
    ///
    /// Returns `PkceError::InvalidChallengeFormat` if the string is not valid base64url.
    pub fn new(challenge: String) -> Result<Self, PkceError> {
        if URL_SAFE_NO_PAD.decode(&challenge).is_err() {
            return Err(PkceError::InvalidChallengeFormat);
        }
        Ok(Self(challenge))
    }

    /// Verify that a verifier matches this challenge in constant time.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` if the verifier doesn't match.
    pub fn verify(&self, verifier: &PkceVerifier) -> Result<(), PkceError> {
        let expected = s256(verifier.as_str());
        if bool::from(expected.as_bytes().ct_eq(self.0.as_bytes())) {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the challenge and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkceChallenge {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn s256(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

// =============================================================================
// Generation / Verification
// =============================================================================

/// A freshly generated verifier together with its derived challenge.
#[derive(Debug, Clone)]
pub struct PkceCredential {
    /// Secret kept by the client until the code exchange.
    pub verifier: PkceVerifier,
    /// Value sent with the authorization request.
    pub challenge: PkceChallenge,
    /// Derivation method (always S256).
    pub method: PkceChallengeMethod,
}

/// Generate a new PKCE verifier/challenge pair.
///
/// # Errors
///
/// Returns `AuthError::RandomnessUnavailable` if the OS RNG fails; no weaker
/// source is substituted.
pub fn generate_challenge() -> AuthResult<PkceCredential> {
    let verifier = PkceVerifier::generate()?;
    let challenge = PkceChallenge::from_verifier(&verifier);
    Ok(PkceCredential {
        verifier,
        challenge,
        method: PkceChallengeMethod::S256,
    })
}

/// Check a raw verifier against a raw challenge received with `method`.
///
/// # Errors
///
/// - `PkceError::UnsupportedMethod` for anything but S256
/// - `PkceError::InvalidVerifierLength` / `InvalidVerifierCharacters` for a
///   malformed verifier
/// - `PkceError::InvalidChallengeFormat` for a challenge that is not base64url
/// - `PkceError::VerificationFailed` if the pair does not match
pub fn verify_pair(verifier: &str, challenge: &str, method: &str) -> Result<(), PkceError> {
    PkceChallengeMethod::parse(method)?;
    let verifier = PkceVerifier::new(verifier.to_string())?;
    PkceChallenge::new(challenge.to_string())?.verify(&verifier)
}

/// Check a raw verifier against a raw S256 challenge.
///
/// Malformed input of either kind simply does not match.
#[must_use]
pub fn verify_challenge(verifier: &str, challenge: &str) -> bool {
    verify_pair(verifier, challenge, PkceChallengeMethod::S256.as_str()).is_ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    fn flip_bit(input: &str, byte: usize, bit: u8) -> String {
        let mut bytes = input.as_bytes().to_vec();
        bytes[byte] ^= 1 << bit;
        String::from_utf8_lossy(&bytes).into_owned()
    }

    // -------------------------------------------------------------------------
    // Verifier Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_verifier_generation() {
        let verifier = PkceVerifier::generate().unwrap();
        assert_eq!(verifier.as_str().len(), 43);
        assert!(
            verifier
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "Generated verifier should only contain base64url characters"
        );
    }

    #[test]
    fn test_verifier_generation_uniqueness() {
        let v1 = PkceVerifier::generate().unwrap();
        let v2 = PkceVerifier::generate().unwrap();
        assert_ne!(v1.as_str(), v2.as_str());
    }

    #[test]
    fn test_verifier_validation_length() {
        assert!(matches!(
            PkceVerifier::new("a".repeat(42)),
            Err(PkceError::InvalidVerifierLength(42))
        ));
        assert!(PkceVerifier::new("a".repeat(43)).is_ok());
        assert!(PkceVerifier::new("a".repeat(128)).is_ok());
        assert!(matches!(
            PkceVerifier::new("a".repeat(129)),
            Err(PkceError::InvalidVerifierLength(129))
        ));
    }

    #[test]
    fn test_verifier_validation_characters_invalid() {
        let invalid = "abcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()".to_string();
        assert!(matches!(
            PkceVerifier::new(invalid),
            Err(PkceError::InvalidVerifierCharacters)
        ));
    }

    #[test]
    fn test_verifier_debug_is_redacted() {
        let verifier = PkceVerifier::new(RFC_VERIFIER.to_string()).unwrap();
        let debug = format!("{verifier:?}");
        assert!(!debug.contains(RFC_VERIFIER));
    }

    // -------------------------------------------------------------------------
    // Challenge Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_challenge_verification() {
        let verifier = PkceVerifier::generate().unwrap();
        let other = PkceVerifier::generate().unwrap();
        let challenge = PkceChallenge::from_verifier(&verifier);

        assert_eq!(challenge.as_str().len(), 43);
        assert!(challenge.verify(&verifier).is_ok());
        assert!(matches!(
            challenge.verify(&other),
            Err(PkceError::VerificationFailed)
        ));
    }

    #[test]
    fn test_challenge_new_invalid() {
        assert!(matches!(
            PkceChallenge::new("not valid base64url!!!".to_string()),
            Err(PkceError::InvalidChallengeFormat)
        ));
    }

    #[test]
    fn test_rfc7636_appendix_b_test_vector() {
        let verifier = PkceVerifier::new(RFC_VERIFIER.to_string()).unwrap();
        let challenge = PkceChallenge::from_verifier(&verifier);
        assert_eq!(challenge.as_str(), RFC_CHALLENGE);
        assert!(verify_challenge(RFC_VERIFIER, RFC_CHALLENGE));
    }

    // -------------------------------------------------------------------------
    // Challenge Method Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_challenge_method_parse() {
        assert_eq!(
            PkceChallengeMethod::parse("S256").unwrap(),
            PkceChallengeMethod::S256
        );

        let err = PkceChallengeMethod::parse("plain").unwrap_err();
        assert!(err.is_challenge_error());
        assert!(err.to_string().contains("plain"));

        assert!(PkceChallengeMethod::parse("S512").is_err());
        assert_eq!(PkceChallengeMethod::default().to_string(), "S256");
    }

    // -------------------------------------------------------------------------
    // generate_challenge / verify_challenge
    // -------------------------------------------------------------------------

    #[test]
    fn test_generated_pairs_verify() {
        for _ in 0..64 {
            let pkce = generate_challenge().unwrap();
            assert_eq!(pkce.method, PkceChallengeMethod::S256);
            assert!(verify_challenge(
                pkce.verifier.as_str(),
                pkce.challenge.as_str()
            ));
        }
    }

    #[test]
    fn test_single_bit_mutation_of_verifier_fails() {
        let pkce = generate_challenge().unwrap();
        let verifier = pkce.verifier.as_str();
        for byte in 0..verifier.len() {
            for bit in 0..8 {
                let mutated = flip_bit(verifier, byte, bit);
                assert!(
                    !verify_challenge(&mutated, pkce.challenge.as_str()),
                    "mutation at byte {byte} bit {bit} should not verify"
                );
            }
        }
    }

    #[test]
    fn test_single_bit_mutation_of_challenge_fails() {
        let pkce = generate_challenge().unwrap();
        let challenge = pkce.challenge.as_str();
        for byte in 0..challenge.len() {
            for bit in 0..8 {
                let mutated = flip_bit(challenge, byte, bit);
                assert!(!verify_challenge(pkce.verifier.as_str(), &mutated));
            }
        }
    }

    #[test]
    fn test_malformed_input_does_not_match() {
        assert!(!verify_challenge("", RFC_CHALLENGE));
        assert!(!verify_challenge("short", RFC_CHALLENGE));
        assert!(!verify_challenge(RFC_VERIFIER, ""));
        assert!(!verify_challenge(RFC_VERIFIER, "%%%"));
        assert!(!verify_challenge(&"é".repeat(50), RFC_CHALLENGE));
    }

    #[test]
    fn test_verify_pair_reports_reason() {
        assert!(verify_pair(RFC_VERIFIER, RFC_CHALLENGE, "S256").is_ok());

        let err = verify_pair(RFC_VERIFIER, RFC_CHALLENGE, "plain").unwrap_err();
        assert!(matches!(err, PkceError::UnsupportedMethod(_)));
        assert!(err.is_challenge_error());

        let err = verify_pair("short", RFC_CHALLENGE, "S256").unwrap_err();
        assert!(err.is_verifier_error());

        let err = verify_pair(RFC_VERIFIER, "%%%", "S256").unwrap_err();
        assert!(matches!(err, PkceError::InvalidChallengeFormat));

        let other = PkceVerifier::generate().unwrap();
        let err = verify_pair(other.as_str(), RFC_CHALLENGE, "S256").unwrap_err();
        assert!(matches!(err, PkceError::VerificationFailed));
        assert_eq!(err.oauth_error_code(), "invalid_grant");
    }

    // -------------------------------------------------------------------------
    // Error Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_error_oauth_codes() {
        assert_eq!(
            PkceError::InvalidVerifierLength(10).oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(
            PkceError::UnsupportedMethod("plain".into()).oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(
            PkceError::VerificationFailed.oauth_error_code(),
            "invalid_grant"
        );
        assert!(PkceError::InvalidVerifierCharacters.is_verifier_error());
        assert!(!PkceError::VerificationFailed.is_verifier_error());
    }
}
