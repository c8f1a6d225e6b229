use std::fmt;

use uuid::Uuid;

use super::identity::Identity;

/// Which of the two credentials a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    /// Short-lived, authorizes ordinary requests.
    Access,
    /// Long-lived, may only mint a new credential pair.
    Refresh,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Access => "access",
            TokenScope::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub identity_id: Uuid,
    /// Present on access tokens only.
    pub handle: Option<String>,
    pub scope: TokenScope,
    /// Unique per issued token.
    pub token_id: Uuid,
    pub expires_at: i64,
}

/// Freshly issued access + refresh tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: i64,
    pub refresh_expires_in: i64,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_expires_in", &self.access_expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .finish()
    }
}

/// The authenticated caller, as carried by a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub identity_id: Uuid,
    pub handle: String,
}

impl Caller {
    /// Build a caller from access-token claims. Refresh claims never qualify.
    pub fn from_access_claims(claims: TokenClaims) -> Option<Self> {
        match (claims.scope, claims.handle) {
            (TokenScope::Access, Some(handle)) => Some(Self {
                identity_id: claims.identity_id,
                handle,
            }),
            _ => None,
        }
    }
}

/// Who is looking: resolved by optional authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated(Caller),
}

impl Viewer {
    pub fn identity_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(caller) => Some(caller.identity_id),
        }
    }
}

impl From<Option<Caller>> for Viewer {
    fn from(caller: Option<Caller>) -> Self {
        caller.map_or(Viewer::Anonymous, Viewer::Authenticated)
    }
}

/// Outcome of login, registration, refresh or profile update.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub credentials: CredentialPair,
}
