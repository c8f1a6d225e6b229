//! Authentication ports: credential codec and password hashing.

use crate::domain::{CredentialPair, Identity, TokenClaims, TokenScope};

/// Issues and verifies the signed access/refresh credentials.
///
/// Implementations hold no server-side state: a token is valid exactly as
/// long as its signature and embedded expiry say so.
pub trait CredentialCodec: Send + Sync {
    /// Mint a fresh access + refresh pair for an identity.
    fn issue(&self, identity: &Identity) -> Result<CredentialPair, AuthError>;

    /// Verify a token against the secret and rules of `expected`.
    fn verify(&self, token: &str, expected: TokenScope) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
///
/// Every variant except `Signing` and `Hashing` means "not authenticated"
/// and must never be treated as fatal.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token has scope {found}, expected {expected}")]
    WrongScope {
        expected: TokenScope,
        found: String,
    },

    #[error("Missing credential")]
    MissingCredential,

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Invalid credential configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// True when the error describes a bad or absent credential rather than a
    /// server-side failure.
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(
            self,
            AuthError::Signing(_) | AuthError::Hashing(_) | AuthError::Configuration(_)
        )
    }
}
