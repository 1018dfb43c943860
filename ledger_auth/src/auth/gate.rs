//! Resolution of a presented bearer token into the active identity behind it.
//!
//! One request moves through `TokenPresented → Decoded → IdentityFetched →
//! Authorized`, short-circuiting to a [`Rejection`] at the first failing step.
//! Every rejection surfaces to the caller as the same unauthorized outcome;
//! the reason is only logged.

use super::{
    errors::{AuthError, AuthResult, Rejection},
    manager::AuthManager,
    models::{Identity, TokenKind, UserId},
};
use crate::{db::IdentityStore, logging::log_security_event};
use log::debug;

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Identity resolution gate for protected operations
#[derive(Clone, Copy)]
pub struct IdentityGate<'a> {
    auth: &'a AuthManager,
}

impl<'a> IdentityGate<'a> {
    pub fn new(auth: &'a AuthManager) -> Self {
        Self { auth }
    }

    /// Resolve the identity behind a raw `Authorization` header value
    ///
    /// # Errors
    ///
    /// * `AuthError::Rejected` - Missing or non-bearer header, or any
    ///   rejection from [`Self::resolve_current_identity`]
    /// * `AuthError::Storage` - Record store failure
    pub async fn resolve_authorization<S>(
        &self,
        store: &S,
        authorization: Option<&str>,
    ) -> AuthResult<Identity>
    where
        S: IdentityStore + ?Sized,
    {
        match authorization.and_then(bearer_token) {
            Some(token) => self.resolve_current_identity(store, token).await,
            None => Err(reject(Rejection::NoCredential, None)),
        }
    }

    /// Resolve the currently authenticated, active identity for an access token
    ///
    /// # Errors
    ///
    /// * `AuthError::Rejected` - `NoCredential`, `InvalidSignature`, `Expired`,
    ///   `MalformedClaims`, `WrongTokenKind`, `MalformedSubject`,
    ///   `UnknownIdentity` or `InactiveIdentity`
    /// * `AuthError::Storage` - Record store failure, never retried
    pub async fn resolve_current_identity<S>(&self, store: &S, token: &str) -> AuthResult<Identity>
    where
        S: IdentityStore + ?Sized,
    {
        self.resolve_as(store, token, TokenKind::Access).await
    }

    pub(crate) async fn resolve_as<S>(
        &self,
        store: &S,
        token: &str,
        expected: TokenKind,
    ) -> AuthResult<Identity>
    where
        S: IdentityStore + ?Sized,
    {
        if token.trim().is_empty() {
            return Err(reject(Rejection::NoCredential, None));
        }

        let claims = self
            .auth
            .verify_token(token)
            .map_err(|e| reject(e.into(), None))?;

        if claims.kind != expected {
            return Err(reject(Rejection::WrongTokenKind, None));
        }

        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| reject(Rejection::MalformedSubject, None))?;

        let identity = store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| reject(Rejection::UnknownIdentity, Some(user_id)))?;

        // Issued tokens are not revoked on deactivation; this check is what
        // stops them
        if !identity.is_active {
            return Err(reject(Rejection::InactiveIdentity, Some(user_id)));
        }

        debug!("Resolved {expected} token for user {user_id}");
        Ok(identity)
    }
}

fn reject(reason: Rejection, user_id: Option<UserId>) -> AuthError {
    match reason {
        Rejection::NoCredential | Rejection::Expired => {
            debug!("Request rejected: {reason}");
        }
        _ => log_security_event("token_rejected", user_id, &reason.to_string()),
    }
    AuthError::Rejected(reason)
}
