//! # Ledger Auth
//!
//! Authentication core for the ledger service: password storage, signed
//! bearer tokens and resolution of a request's credential to the active
//! identity behind it.
//!
//! ## Architecture
//!
//! The crate is split into a synchronous core and an async record store:
//!
//! - **Credentials**: Argon2id password hashing and verification
//! - **Tokens**: HMAC-signed JWT access and refresh tokens
//! - **Manager**: login, registration, refresh and deactivation flows
//! - **Gate**: bearer token to active identity, with a typed rejection reason
//! - **Store**: the [`db::IdentityStore`] contract with PostgreSQL and
//!   in-memory implementations
//!
//! ## Core Modules
//!
//! - [`auth`]: Credentials, tokens, manager and gate
//! - [`db`]: Identity record stores and connection pool
//! - [`config`]: Environment-driven configuration
//! - [`logging`]: Security event logging
//!
//! ## Example
//!
//! ```
//! use ledger_auth::{AuthConfig, AuthManager};
//!
//! let config = AuthConfig::from_lookup(|key| match key {
//!     "JWT_SECRET" => Some("an-example-secret-that-is-long-enough".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//! let auth = AuthManager::from_config(&config).unwrap();
//!
//! let token = auth.issue_access_token(1).unwrap();
//! assert_eq!(auth.verify_token(&token).unwrap().sub, "1");
//! ```

/// Credentials, tokens and identity resolution.
pub mod auth;
pub use auth::{
    AuthError, AuthManager, AuthResult, Claims, Identity, IdentityGate, NewIdentity, Rejection,
    SessionTokens, TokenError, TokenKind, UserId,
};

/// Environment-driven configuration.
pub mod config;
pub use config::{AuthConfig, ConfigError, HashingConfig};

/// Identity record stores.
pub mod db;

/// Security event logging.
pub mod logging;
