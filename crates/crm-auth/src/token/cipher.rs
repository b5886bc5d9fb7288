//! Authenticated encryption of credential claims.
//!
//! Opaque credential strings are `base64url_nopad(nonce || ciphertext)`,
//! where the ciphertext is AES-256-GCM over the JSON claims with a fixed
//! associated-data label. Any modification of the string fails the GCM tag
//! check and is reported as [`InvalidCredential`].

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
};

use crate::AuthResult;
use crate::config::SecretConfig;
use crate::error::{AuthError, InvalidCredential};
use crate::random::random_bytes;
use crate::token::claims::CredentialClaims;

/// Nonce size for AES-256-GCM (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits).
pub const KEY_SIZE: usize = 32;

/// GCM authentication tag size.
const TAG_SIZE: usize = 16;

/// Default environment variable holding the claim key.
pub const DEFAULT_KEY_ENV: &str = "CRM_AUTH_SECRET_KEY";

/// Associated data bound into every ciphertext.
const AAD: &[u8] = b"crm-auth/credential/v1";

/// Upper bound on accepted opaque strings, checked before decoding.
const MAX_OPAQUE_LEN: usize = 512;

/// Where an [`EncryptionKey`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Read from an environment variable.
    Environment,
    /// Supplied by the embedding application.
    Provided,
    /// Generated for this process only.
    Ephemeral,
}

/// 256-bit claim encryption key.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
    source: KeySource,
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl EncryptionKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self {
            bytes,
            source: KeySource::Provided,
        }
    }

    /// Parses a key from a hex or base64 string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the string is neither 64 hex
    /// characters nor base64 of exactly 32 bytes.
    pub fn parse(encoded: &str) -> AuthResult<Self> {
        let encoded = encoded.trim();

        if encoded.len() == KEY_SIZE * 2 {
            if let Ok(bytes) = hex::decode(encoded) {
                return Self::from_slice(&bytes);
            }
        }

        let bytes = BASE64
            .decode(encoded)
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
            .map_err(|e| AuthError::configuration(format!("Invalid base64 key: {e}")))?;
        Self::from_slice(&bytes)
    }

    fn from_slice(bytes: &[u8]) -> AuthResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            AuthError::configuration(format!(
                "Key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Generates a fresh random key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RandomnessUnavailable` if the OS RNG fails.
    pub fn generate() -> AuthResult<Self> {
        Ok(Self::from_bytes(random_bytes::<KEY_SIZE>()?))
    }

    /// Reads the key from an environment variable.
    ///
    /// Returns `Ok(None)` if the variable is not set.
    pub fn from_env(var: &str) -> AuthResult<Option<Self>> {
        match std::env::var(var) {
            Ok(value) => {
                let mut key = Self::parse(&value)
                    .map_err(|e| AuthError::configuration(format!("{var}: {e}")))?;
                key.source = KeySource::Environment;
                Ok(Some(key))
            }
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(AuthError::configuration(format!(
                "Failed to read {var}: {e}"
            ))),
        }
    }

    /// Resolves the key described by `config`.
    ///
    /// Falls back to an ephemeral key when the variable is unset, unless
    /// `require_key` is set. Credentials sealed with an ephemeral key do not
    /// survive a restart.
    pub fn from_config(config: &SecretConfig) -> AuthResult<Self> {
        if let Some(key) = Self::from_env(&config.key_env)? {
            return Ok(key);
        }

        if config.require_key {
            return Err(AuthError::configuration(format!(
                "{} is not set and secret.require_key is enabled",
                config.key_env
            )));
        }

        tracing::warn!(
            env = %config.key_env,
            "Claim encryption key not configured, using an ephemeral key; \
             issued credentials will not survive a restart"
        );
        let mut key = Self::generate()?;
        key.source = KeySource::Ephemeral;
        Ok(key)
    }

    /// Where this key came from.
    #[must_use]
    pub fn source(&self) -> KeySource {
        self.source
    }

    /// Hex encoding of the key, suitable for `CRM_AUTH_SECRET_KEY`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Standard base64 encoding of the key.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }
}

/// Seals and opens [`CredentialClaims`].
pub struct ClaimCipher {
    aead: Aes256Gcm,
}

impl std::fmt::Debug for ClaimCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimCipher").finish_non_exhaustive()
    }
}

impl ClaimCipher {
    /// Creates a cipher for the given key.
    #[must_use]
    pub fn new(key: &EncryptionKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&key.bytes);
        Self {
            aead: Aes256Gcm::new(key),
        }
    }

    /// Encrypts claims into an opaque credential string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RandomnessUnavailable` if no nonce can be drawn,
    /// or `AuthError::Internal` if encoding or encryption fails.
    pub fn seal(&self, claims: &CredentialClaims) -> AuthResult<String> {
        let plaintext = claims
            .encode()
            .map_err(|e| AuthError::internal(format!("Failed to encode claims: {e}")))?;
        let nonce_bytes = random_bytes::<NONCE_SIZE>()?;

        let ciphertext = self
            .aead
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &plaintext,
                    aad: AAD,
                },
            )
            .map_err(|e| AuthError::internal(format!("Encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypts and authenticates an opaque credential string.
    pub fn open(&self, opaque: &str) -> Result<CredentialClaims, InvalidCredential> {
        if opaque.is_empty() || opaque.len() > MAX_OPAQUE_LEN {
            return Err(InvalidCredential);
        }

        let sealed = URL_SAFE_NO_PAD
            .decode(opaque)
            .map_err(|_| InvalidCredential)?;
        if sealed.len() <= NONCE_SIZE + TAG_SIZE {
            return Err(InvalidCredential);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = self
            .aead
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: AAD,
                },
            )
            .map_err(|_| InvalidCredential)?;

        CredentialClaims::decode(&plaintext).map_err(|_| InvalidCredential)
    }
}
