//! Authentication manager implementation.

use super::{
    credentials::CredentialStore,
    errors::{AuthError, AuthResult, TokenError},
    gate::IdentityGate,
    models::{
        Claims, Identity, NewIdentity, ProfileUpdate, SessionTokens, TokenKind, TokenTtls, UserId,
    },
    token::TokenCodec,
};
use crate::{
    config::{AuthConfig, ConfigError},
    db::IdentityStore,
    logging::log_security_event,
};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Authentication manager
///
/// Holds only process-wide, read-only configuration. The record store is
/// handed in per call so each request can use its own transaction scope.
#[derive(Clone)]
pub struct AuthManager {
    codec: TokenCodec,
    credentials: CredentialStore,
    ttls: TokenTtls,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `codec` - Token codec holding the signing secret and algorithm
    /// * `credentials` - Password hasher
    /// * `ttls` - Lifetime of each token kind
    pub fn new(codec: TokenCodec, credentials: CredentialStore, ttls: TokenTtls) -> Self {
        Self {
            codec,
            credentials,
            ttls,
        }
    }

    /// Build a manager from validated configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the algorithm or hashing parameters
    /// are unusable
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.algorithm).map_err(
            |e| ConfigError::Invalid {
                var: "JWT_ALGORITHM".to_string(),
                reason: e.to_string(),
            },
        )?;
        let credentials = CredentialStore::new(config.hashing.params()?);

        Ok(Self::new(codec, credentials, config.token_ttls()))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn ttls(&self) -> TokenTtls {
        self.ttls
    }

    /// Gate resolving bearer tokens into active identities
    pub fn gate(&self) -> IdentityGate<'_> {
        IdentityGate::new(self)
    }

    /// Authenticate an email/password pair
    ///
    /// # Returns
    ///
    /// * `AuthResult<Option<Identity>>` - The identity, or `None` when the
    ///   email is unknown, the account is inactive, or the password is wrong.
    ///   The three cases are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// * `AuthError::Storage` - Record store failure
    pub async fn authenticate<S>(
        &self,
        store: &S,
        email: &str,
        password: &str,
    ) -> AuthResult<Option<Identity>>
    where
        S: IdentityStore + ?Sized,
    {
        let Some(identity) = store.find_by_email(email).await? else {
            // Keep the hashing cost of unknown accounts in line with known ones
            self.credentials.verify_decoy(password);
            log_security_event("login_failed", None, "unknown email");
            return Ok(None);
        };

        let verified = self.credentials.verify_password(&identity, password);

        if !identity.is_active {
            log_security_event("login_failed", Some(identity.id), "inactive identity");
            return Ok(None);
        }

        if !verified {
            log_security_event("login_failed", Some(identity.id), "wrong password");
            return Ok(None);
        }

        debug!("User {} authenticated", identity.id);
        Ok(Some(identity))
    }

    /// Authenticate and issue an access/refresh token pair
    ///
    /// Hashes created under outdated parameters are upgraded and persisted
    /// while the plaintext is at hand.
    ///
    /// # Errors
    ///
    /// * `AuthError::Storage` - Record store failure
    /// * `AuthError::Token` - Token encoding failed
    pub async fn login<S>(
        &self,
        store: &S,
        email: &str,
        password: &str,
    ) -> AuthResult<Option<SessionTokens>>
    where
        S: IdentityStore + ?Sized,
    {
        let Some(mut identity) = self.authenticate(store, email, password).await? else {
            return Ok(None);
        };

        if self.credentials.needs_rehash(&identity) {
            self.credentials.set_password(&mut identity, password)?;
            identity.updated_at = Some(Utc::now());
            store.persist(&identity).await?;
            info!("Upgraded password hash for user {}", identity.id);
        }

        self.session_tokens(identity.id).map(Some)
    }

    /// Exchange a valid refresh token for a new token pair
    ///
    /// # Errors
    ///
    /// * `AuthError::Rejected` - Token invalid, expired, not a refresh token,
    ///   or its identity is unknown or inactive
    /// * `AuthError::Storage` - Record store failure
    pub async fn refresh<S>(&self, store: &S, refresh_token: &str) -> AuthResult<SessionTokens>
    where
        S: IdentityStore + ?Sized,
    {
        let identity = self
            .gate()
            .resolve_as(store, refresh_token, TokenKind::Refresh)
            .await?;

        self.session_tokens(identity.id)
    }

    /// Register a new identity
    ///
    /// # Errors
    ///
    /// * `AuthError::EmailTaken` - Email already exists
    /// * `AuthError::WeakCredential` - Password too short
    /// * `AuthError::Storage` - Record store failure
    pub async fn register<S>(&self, store: &S, request: NewIdentity) -> AuthResult<Identity>
    where
        S: IdentityStore + ?Sized,
    {
        if store.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let digest = self.credentials.hash_password(&request.password)?;
        let user_id = store
            .create_identity(
                &request.email,
                &request.first_name,
                &request.last_name,
                &digest,
            )
            .await?;

        info!("Registered user {user_id}");
        store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Deactivate an identity (soft delete)
    ///
    /// Tokens already issued to the identity stay cryptographically valid
    /// until they expire; the gate refuses them because of the inactive flag.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No such identity
    /// * `AuthError::Storage` - Record store failure
    pub async fn deactivate<S>(&self, store: &S, user_id: UserId) -> AuthResult<Identity>
    where
        S: IdentityStore + ?Sized,
    {
        let mut identity = store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        identity.is_active = false;
        identity.updated_at = Some(Utc::now());
        store.persist(&identity).await?;

        log_security_event("identity_deactivated", Some(user_id), "account deactivated");
        Ok(identity)
    }

    /// Change an identity's first and/or last name
    ///
    /// Fields left as `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No such identity
    /// * `AuthError::Storage` - Record store failure
    pub async fn update_profile<S>(
        &self,
        store: &S,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> AuthResult<Identity>
    where
        S: IdentityStore + ?Sized,
    {
        let mut identity = store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(first_name) = update.first_name {
            identity.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            identity.last_name = last_name;
        }
        identity.updated_at = Some(Utc::now());
        store.persist(&identity).await?;

        debug!("Updated profile for user {user_id}");
        Ok(identity)
    }

    /// Issue a short-lived access token
    pub fn issue_access_token(&self, user_id: UserId) -> AuthResult<String> {
        self.issue_token_at(user_id, TokenKind::Access, Utc::now())
    }

    /// Issue a refresh token
    pub fn issue_refresh_token(&self, user_id: UserId) -> AuthResult<String> {
        self.issue_token_at(user_id, TokenKind::Refresh, Utc::now())
    }

    /// Issue a token of `kind` as if the current time were `now`
    pub fn issue_token_at(
        &self,
        user_id: UserId,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let claims = Claims::new(user_id, kind, now, self.ttls.ttl(kind))?;
        Ok(self.codec.encode(&claims)?)
    }

    /// Verify a token's signature, expiry and claims.
    ///
    /// Does not consult the record store.
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.codec.decode(token)
    }

    fn session_tokens(&self, user_id: UserId) -> AuthResult<SessionTokens> {
        Ok(SessionTokens {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
            token_type: "bearer".to_string(),
            expires_in: self.ttls.access.num_seconds(),
        })
    }
}
