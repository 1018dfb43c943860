//! Authentication error types.

use thiserror::Error;

/// Token verification and encoding failures.
///
/// The variants are kept distinct for internal diagnostics only; callers
/// facing end users should go through [`AuthError::client_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Claims could not be encoded
    #[error("Token encoding failed: {0}")]
    Encoding(String),

    /// Integrity tag mismatch, foreign algorithm, or undecodable token
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is past its expiry
    #[error("Token expired")]
    Expired,

    /// Signed payload is missing required claims
    #[error("Malformed token claims")]
    MalformedClaims,
}

/// Reasons the identity gate refuses a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No bearer token was presented
    #[error("No credential presented")]
    NoCredential,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token claims")]
    MalformedClaims,

    /// A refresh token was presented where an access token is required
    #[error("Wrong token kind")]
    WrongTokenKind,

    /// Subject claim is not a numeric user ID
    #[error("Malformed token subject")]
    MalformedSubject,

    #[error("Unknown identity")]
    UnknownIdentity,

    #[error("Inactive identity")]
    InactiveIdentity,
}

impl From<TokenError> for Rejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Rejection::Expired,
            TokenError::MalformedClaims => Rejection::MalformedClaims,
            TokenError::InvalidSignature | TokenError::Encoding(_) => Rejection::InvalidSignature,
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Record store failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Password does not meet the minimum policy
    #[error("Weak credential: {0}")]
    WeakCredential(String),

    /// Email already registered
    #[error("Email already exists")]
    EmailTaken,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Token encoding or verification failure
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Identity gate rejection
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),
}

impl AuthError {
    /// Whether this error must surface as an unauthorized response.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::Rejected(_) => true,
            AuthError::Token(TokenError::Encoding(_)) => false,
            AuthError::Token(_) => true,
            _ => false,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Every token and gate failure collapses to the same message so callers
    /// cannot tell an expired token from a forged one or a deactivated account.
    pub fn client_message(&self) -> String {
        if self.is_unauthorized() {
            return "Unauthorized".to_string();
        }

        match self {
            AuthError::Storage(_) | AuthError::HashingFailed | AuthError::Token(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
