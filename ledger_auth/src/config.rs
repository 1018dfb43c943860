//! Authentication configuration management.
//!
//! Consolidates the environment variables the auth core reads and validates
//! them once at startup. The resulting [`AuthConfig`] is immutable and is
//! injected into [`crate::auth::AuthManager`]; nothing reads ambient state
//! afterwards.

use crate::auth::{SUPPORTED_ALGORITHMS, TokenTtls};
use argon2::Params;
use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use std::{fmt, str::FromStr};

/// Minimum signing secret length (128-bit security for hex secrets)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Token signing and password hashing configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT signing secret (required, never defaulted)
    pub jwt_secret: String,
    /// HMAC signing algorithm
    pub algorithm: Algorithm,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Argon2 cost parameters
    pub hashing: HashingConfig,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// Argon2 parameters for these settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if argon2 rejects the combination
    pub fn params(&self) -> Result<Params, ConfigError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| {
            ConfigError::Invalid {
                var: "PASSWORD_HASH_MEMORY_KIB".to_string(),
                reason: format!(
                    "m={}, t={}, p={} rejected: {e}",
                    self.memory_kib, self.iterations, self.parallelism
                ),
            }
        })
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    ///
    /// Variables:
    /// - `JWT_SECRET`: signing secret, at least 32 characters (required)
    /// - `JWT_ALGORITHM`: `HS256`, `HS384` or `HS512` (default: `HS256`)
    /// - `ACCESS_TOKEN_EXPIRE_MINUTES`: access token TTL (default: 30)
    /// - `REFRESH_TOKEN_EXPIRE_MINUTES`: refresh token TTL (default: 30)
    /// - `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS`,
    ///   `PASSWORD_HASH_PARALLELISM`: Argon2 costs (default: argon2 defaults)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(name) => Algorithm::from_str(name.trim()).map_err(|_| ConfigError::Invalid {
                var: "JWT_ALGORITHM".to_string(),
                reason: format!("Unknown algorithm '{name}'"),
            })?,
            None => Algorithm::HS256,
        };

        let hashing = HashingConfig {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", Params::DEFAULT_M_COST)?,
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", Params::DEFAULT_T_COST)?,
            parallelism: parse_or(&lookup, "PASSWORD_HASH_PARALLELISM", Params::DEFAULT_P_COST)?,
        };

        let config = AuthConfig {
            jwt_secret,
            algorithm,
            access_token_ttl: minutes(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_token_ttl: minutes(&lookup, "REFRESH_TOKEN_EXPIRE_MINUTES", 30)?,
            hashing,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_SECRET_LENGTH} characters"),
            });
        }

        if !SUPPORTED_ALGORITHMS.contains(&self.algorithm) {
            return Err(ConfigError::Invalid {
                var: "JWT_ALGORITHM".to_string(),
                reason: "Only HS256, HS384 and HS512 work with a shared secret".to_string(),
            });
        }

        check_ttl("ACCESS_TOKEN_EXPIRE_MINUTES", self.access_token_ttl)?;
        check_ttl("REFRESH_TOKEN_EXPIRE_MINUTES", self.refresh_token_ttl)?;

        self.hashing.params()?;
        Ok(())
    }

    pub fn token_ttls(&self) -> TokenTtls {
        TokenTtls {
            access: self.access_token_ttl,
            refresh: self.refresh_token_ttl,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("hashing", &self.hashing)
            .finish()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse `key` from `lookup`, falling back to `default` when unset
pub(crate) fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse '{value}'"),
        }),
        None => Ok(default),
    }
}

fn check_ttl(var: &str, ttl: Duration) -> Result<(), ConfigError> {
    if ttl <= Duration::zero() {
        return Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: "Must be greater than 0".to_string(),
        });
    }

    // Expiry timestamps must stay representable when tokens are issued
    if Utc::now().checked_add_signed(ttl).is_none() {
        return Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: "Lifetime too large".to_string(),
        });
    }
    Ok(())
}

fn minutes<F>(lookup: &F, key: &str, default: i64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value: i64 = parse_or(lookup, key, default)?;
    Duration::try_minutes(value).ok_or_else(|| ConfigError::Invalid {
        var: key.to_string(),
        reason: "Out of range".to_string(),
    })
}
