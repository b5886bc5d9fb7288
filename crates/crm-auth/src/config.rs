//! Credential service configuration.
//!
//! Lifetimes, session binding, secret key source, expiry sweeping and audit
//! switches. Durations use humantime notation (`"15m"`, `"8h"`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::token::cipher::DEFAULT_KEY_ENV;

/// Root credential service configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [token]
/// default_ttl = "15m"
/// max_ttl = "24h"
///
/// [session]
/// ttl = "8h"
/// strict_binding = true
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token settings.
    pub token: TokenConfig,

    /// Session handle settings.
    pub session: SessionConfig,

    /// Claim encryption key source.
    pub secret: SecretConfig,

    /// Background expiry sweep.
    pub sweep: SweepConfig,

    /// Audit configuration.
    pub audit: AuditConfig,
}

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime used when the caller does not choose one.
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Longest lifetime a caller may request.
    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(15 * 60), // 15 minutes
            max_ttl: Duration::from_secs(24 * 3600),   // 24 hours
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime used when the caller does not choose one.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Longest lifetime a caller may request.
    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,

    /// Reject sessions presented from a different client context.
    /// When disabled the mismatch is only logged.
    pub strict_binding: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(8 * 3600),          // 8 hours
            max_ttl: Duration::from_secs(7 * 24 * 3600), // 7 days
            strict_binding: true,
        }
    }
}

/// Secret key configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretConfig {
    /// Environment variable holding the 32-byte key (hex or base64).
    pub key_env: String,

    /// Fail at startup instead of generating a process-lifetime key.
    pub require_key: bool,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            key_env: DEFAULT_KEY_ENV.to_string(),
            require_key: false,
        }
    }
}

/// Expiry sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Run the background sweeper.
    pub enabled: bool,

    /// Time between sweeps.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Log issue, revoke and sweep operations.
    pub log_token_operations: bool,

    /// Log rejected validations with their internal reason.
    pub log_failed_validation: bool,

    /// Log session binding mismatches.
    pub log_binding_mismatch: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_token_operations: true,
            log_failed_validation: true,
            log_binding_mismatch: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a lifetime or interval is zero,
    /// a default lifetime exceeds its maximum, or the key variable is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.default_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "token.default_ttl must be > 0".to_string(),
            ));
        }

        if self.token.default_ttl > self.token.max_ttl {
            return Err(ConfigError::InvalidValue(format!(
                "token.default_ttl ({:?}) exceeds token.max_ttl ({:?})",
                self.token.default_ttl, self.token.max_ttl,
            )));
        }

        if self.session.ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session.ttl must be > 0".to_string(),
            ));
        }

        if self.session.ttl > self.session.max_ttl {
            return Err(ConfigError::InvalidValue(format!(
                "session.ttl ({:?}) exceeds session.max_ttl ({:?})",
                self.session.ttl, self.session.max_ttl,
            )));
        }

        if self.secret.key_env.trim().is_empty() {
            return Err(ConfigError::Missing("secret.key_env".to_string()));
        }

        if self.sweep.enabled && self.sweep.interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "sweep.interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

pub mod loader {
    use super::{AuthConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Prefix for environment overrides, e.g. `CRM_AUTH__SESSION__TTL=12h`.
    pub const ENV_PREFIX: &str = "CRM_AUTH";

    /// Loads configuration from an optional TOML file plus environment
    /// overrides, then validates it.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_config(path: Option<&str>) -> Result<AuthConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("crm-auth.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("config build error: {e}")))?;
        let merged: AuthConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Load(format!("config deserialize error: {e}")))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.token.default_ttl, Duration::from_secs(900));
        assert_eq!(config.session.ttl, Duration::from_secs(8 * 3600));
        assert!(config.session.strict_binding);
        assert_eq!(config.secret.key_env, "CRM_AUTH_SECRET_KEY");
        assert!(!config.secret.require_key);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AuthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_token_ttl_fails_validation() {
        let mut config = AuthConfig::default();
        config.token.default_ttl = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("token.default_ttl"));
    }

    #[test]
    fn test_default_above_max_fails_validation() {
        let mut config = AuthConfig::default();
        config.token.default_ttl = Duration::from_secs(48 * 3600);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds token.max_ttl"));

        let mut config = AuthConfig::default();
        config.session.ttl = Duration::from_secs(30 * 24 * 3600);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.max_ttl"));
    }

    #[test]
    fn test_empty_key_env_fails_validation() {
        let mut config = AuthConfig::default();
        config.secret.key_env = "  ".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Missing(_)
        ));
    }

    #[test]
    fn test_disabled_sweep_skips_interval_validation() {
        let mut config = AuthConfig::default();
        config.sweep.interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.sweep.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing_with_humantime() {
        let config: AuthConfig = toml::from_str(
            r#"
[token]
default_ttl = "5m"

[session]
ttl = "12h"
strict_binding = false

[sweep]
interval = "30s"
"#,
        )
        .unwrap();
        assert_eq!(config.token.default_ttl, Duration::from_secs(300));
        assert_eq!(config.token.max_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.session.ttl, Duration::from_secs(12 * 3600));
        assert!(!config.session.strict_binding);
        assert_eq!(config.sweep.interval, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue("test error".to_string());
        assert_eq!(err.to_string(), "Invalid configuration value: test error");

        let err = ConfigError::Missing("secret.key_env".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: secret.key_env"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = AuthConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AuthConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.token.default_ttl, parsed.token.default_ttl);
        assert_eq!(config.session.strict_binding, parsed.session.strict_binding);
    }
}
