//! Authentication module providing credential storage, token issuance and
//! identity resolution.
//!
//! This module implements:
//! - Argon2id password hashing with PHC-encoded, migratable hashes
//! - HMAC-signed JWT access and refresh tokens with independent lifetimes
//! - Uniform login failures (unknown email, wrong password and inactive
//!   account are indistinguishable)
//! - A gate that turns a bearer token into the active identity behind it
//!
//! ## Example
//!
//! ```no_run
//! use ledger_auth::auth::{AuthManager, NewIdentity};
//! use ledger_auth::config::AuthConfig;
//! use ledger_auth::db::MemoryIdentityStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::from_env()?;
//!     let auth = AuthManager::from_config(&config)?;
//!     let store = MemoryIdentityStore::new();
//!
//!     let request = NewIdentity {
//!         email: "a@x.com".to_string(),
//!         first_name: "Ada".to_string(),
//!         last_name: "Lovelace".to_string(),
//!         password: "Passw0rd".to_string(),
//!     };
//!     auth.register(&store, request).await?;
//!
//!     if let Some(tokens) = auth.login(&store, "a@x.com", "Passw0rd").await? {
//!         let user = auth
//!             .gate()
//!             .resolve_current_identity(&store, &tokens.access_token)
//!             .await?;
//!         println!("Authenticated as {}", user.email);
//!     }
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod errors;
pub mod gate;
pub mod manager;
pub mod models;
pub mod token;

pub use credentials::{CredentialStore, MIN_PASSWORD_LENGTH};
pub use errors::{AuthError, AuthResult, Rejection, TokenError};
pub use gate::{IdentityGate, bearer_token};
pub use manager::AuthManager;
pub use models::{
    Claims, Identity, NewIdentity, PasswordDigest, ProfileUpdate, SessionTokens, TokenKind,
    TokenTtls, UserId,
};
pub use token::{SUPPORTED_ALGORITHMS, TokenCodec};
