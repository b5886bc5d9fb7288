//! Credential service error types.
//!
//! Issuance and storage failures surface as [`AuthError`]. Validation has a
//! single, deliberately undifferentiated failure, [`InvalidCredential`], so a
//! caller probing the service cannot tell an expired credential from a
//! revoked, unknown or malformed one.

use std::fmt;

/// Errors that can occur while issuing, storing or revoking credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The operating system random source could not be read.
    ///
    /// Fatal: credentials are never minted from a weaker generator.
    #[error("Secure randomness unavailable: {message}")]
    RandomnessUnavailable {
        /// Description of the underlying RNG failure.
        message: String,
    },

    /// The requested lifetime is zero, negative or above the configured maximum.
    #[error("Invalid TTL: {message}")]
    InvalidTtl {
        /// Description of why the TTL was rejected.
        message: String,
    },

    /// A credential with the same identifier is already stored.
    ///
    /// This indicates a randomness or store defect and is never retried.
    #[error("Duplicate credential id (fingerprint {fingerprint})")]
    DuplicateId {
        /// Short SHA-256 fingerprint of the colliding id.
        fingerprint: String,
    },

    /// No credential is stored under the requested identifier.
    #[error("Credential not found")]
    NotFound,

    /// The backing credential store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The service configuration or secret material is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `RandomnessUnavailable` error.
    #[must_use]
    pub fn randomness_unavailable(message: impl Into<String>) -> Self {
        Self::RandomnessUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidTtl` error.
    #[must_use]
    pub fn invalid_ttl(message: impl Into<String>) -> Self {
        Self::InvalidTtl {
            message: message.into(),
        }
    }

    /// Creates a new `DuplicateId` error.
    #[must_use]
    pub fn duplicate_id(fingerprint: impl Into<String>) -> Self {
        Self::DuplicateId {
            fingerprint: fingerprint.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller supplied a bad argument.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidTtl { .. } | Self::NotFound)
    }

    /// Returns `true` if the service cannot safely keep issuing credentials.
    ///
    /// Fatal errors should alert operators rather than be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RandomnessUnavailable { .. } | Self::DuplicateId { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RandomnessUnavailable { .. } => ErrorCategory::Entropy,
            Self::InvalidTtl { .. } => ErrorCategory::Validation,
            Self::DuplicateId { .. } => ErrorCategory::Invariant,
            Self::NotFound => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of credential service errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The random source failed.
    Entropy,
    /// Caller supplied invalid input.
    Validation,
    /// An internal invariant was violated.
    Invariant,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entropy => write!(f, "entropy"),
            Self::Validation => write!(f, "validation"),
            Self::Invariant => write!(f, "invariant"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// The single failure outcome of credential validation.
///
/// Expired, revoked, unknown, tampered and undecodable credentials all map
/// here; the reason is only recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Invalid credential")]
pub struct InvalidCredential;
