//! Password hashing and verification.

use super::{
    errors::{AuthError, AuthResult},
    models::{Identity, PasswordDigest},
};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use log::warn;
use std::sync::OnceLock;

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Argon2id credential store.
///
/// Owns the hashing parameters only; identities are borrowed per call and
/// persistence is left to the record store.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
    params: Params,
    decoy: OnceLock<Option<PasswordDigest>>,
}

impl CredentialStore {
    /// Create a credential store hashing with Argon2id and `params`
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            params,
            decoy: OnceLock::new(),
        }
    }

    /// Hash `plaintext` and store it on `identity`, replacing any prior hash.
    ///
    /// # Errors
    ///
    /// * `AuthError::WeakCredential` - Password shorter than 8 characters; the
    ///   identity is left untouched
    /// * `AuthError::HashingFailed` - Hasher rejected the input
    pub fn set_password(&self, identity: &mut Identity, plaintext: &str) -> AuthResult<()> {
        identity.password = self.hash_password(plaintext)?;
        Ok(())
    }

    /// Hash `plaintext` with a fresh random salt
    pub fn hash_password(&self, plaintext: &str) -> AuthResult<PasswordDigest> {
        check_policy(plaintext)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?;

        Ok(PasswordDigest::from_stored(hash.to_string()))
    }

    /// Check `plaintext` against the identity's stored hash.
    ///
    /// Never fails: a mismatch or an unreadable stored hash yields `false`.
    pub fn verify_password(&self, identity: &Identity, plaintext: &str) -> bool {
        self.verify_digest(&identity.password, plaintext)
    }

    /// Whether the stored hash predates the current algorithm or cost settings
    pub fn needs_rehash(&self, identity: &Identity) -> bool {
        let Ok(parsed) = PasswordHash::new(identity.password.as_stored()) else {
            return true;
        };

        if parsed.algorithm.as_str() != "argon2id" || parsed.version != Some(Version::V0x13 as u32)
        {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }

    /// Run one verification against a throwaway hash.
    ///
    /// Used when no identity matched so that unknown accounts cost the same
    /// hashing work as known ones.
    pub(crate) fn verify_decoy(&self, plaintext: &str) {
        let decoy = self
            .decoy
            .get_or_init(|| self.hash_password(DECOY_PASSWORD).ok());

        if let Some(digest) = decoy {
            let _ = self.verify_digest(digest, plaintext);
        }
    }

    fn verify_digest(&self, digest: &PasswordDigest, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(digest.as_stored()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is unreadable: {e}");
                return false;
            }
        };

        // Algorithm, version and params are taken from the stored hash
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

fn check_policy(plaintext: &str) -> AuthResult<()> {
    if plaintext.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakCredential(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fast_store() -> CredentialStore {
        CredentialStore::new(Params::new(256, 1, 1, None).unwrap())
    }

    fn identity() -> Identity {
        Identity {
            id: 1,
            email: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: PasswordDigest::from_stored("unset"),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_set_and_verify_password() {
        let store = fast_store();
        let mut user = identity();

        store.set_password(&mut user, "Passw0rd").unwrap();

        assert!(user.password.as_stored().starts_with("$argon2id$"));
        assert!(!user.password.as_stored().contains("Passw0rd"));
        assert!(store.verify_password(&user, "Passw0rd"));
        assert!(!store.verify_password(&user, "Passw0rD"));
        assert!(!store.verify_password(&user, ""));
    }

    #[test]
    fn test_short_password_rejected_and_hash_untouched() {
        let store = fast_store();
        let mut user = identity();
        store.set_password(&mut user, "Passw0rd").unwrap();
        let before = user.password.clone();

        let err = store.set_password(&mut user, "short").unwrap_err();

        assert!(matches!(err, AuthError::WeakCredential(_)));
        assert_eq!(user.password, before);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let store = fast_store();
        let mut user = identity();

        // 7 characters, 14 bytes
        let err = store.set_password(&mut user, "ééééééé").unwrap_err();
        assert!(matches!(err, AuthError::WeakCredential(_)));

        store.set_password(&mut user, "éééééééé").unwrap();
        assert!(store.verify_password(&user, "éééééééé"));
    }

    #[test]
    fn test_same_password_salted_differently() {
        let store = fast_store();
        let a = store.hash_password("Passw0rd").unwrap();
        let b = store.hash_password("Passw0rd").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unreadable_hash_does_not_verify() {
        let store = fast_store();
        let mut user = identity();
        user.password = PasswordDigest::from_stored("plaintext-password");

        assert!(!store.verify_password(&user, "plaintext-password"));
        assert!(store.needs_rehash(&user));
    }

    #[test]
    fn test_old_parameters_still_verify_and_flag_rehash() {
        let old = CredentialStore::new(Params::new(128, 1, 1, None).unwrap());
        let current = fast_store();
        let mut user = identity();

        old.set_password(&mut user, "Passw0rd").unwrap();

        assert!(current.verify_password(&user, "Passw0rd"));
        assert!(current.needs_rehash(&user));
        assert!(!old.needs_rehash(&user));
    }

    #[test]
    fn test_decoy_verification_is_harmless() {
        let store = fast_store();
        store.verify_decoy("anything");
        store.verify_decoy("anything else");
    }
}
