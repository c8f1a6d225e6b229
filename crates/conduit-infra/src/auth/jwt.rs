//! JWT credential codec: access and refresh tokens under separate secrets.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use conduit_core::domain::{CredentialPair, Identity, TokenClaims, TokenScope};
use conduit_core::ports::{AuthError, CredentialCodec};

/// Credential codec configuration.
///
/// Built once at startup and handed to [`JwtCredentialCodec::new`].
#[derive(Clone)]
pub struct CredentialConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
    pub issuer: String,
}

impl CredentialConfig {
    pub const ACCESS_TTL_MINUTES: i64 = 15;
    pub const REFRESH_TTL_DAYS: i64 = 7;

    /// Standard lifetimes (15 minutes / 7 days) with the given secrets.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: TimeDelta::minutes(Self::ACCESS_TTL_MINUTES),
            refresh_ttl: TimeDelta::days(Self::REFRESH_TTL_DAYS),
            issuer: "conduit-api".to_string(),
        }
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Internal JWT claims structure for serialization.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // identity id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    handle: Option<String>,
    typ: String, // "access" | "refresh"
    jti: String,
    exp: i64,
    iat: i64,
    iss: String,
}

struct ScopeKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl ScopeKeys {
    fn new(secret: &str, ttl: TimeDelta) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// JWT-based credential codec (HS256).
pub struct JwtCredentialCodec {
    access: ScopeKeys,
    refresh: ScopeKeys,
    issuer: String,
}

impl JwtCredentialCodec {
    pub fn new(config: CredentialConfig) -> Result<Self, AuthError> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(AuthError::Configuration(
                "signing secrets must not be empty".to_string(),
            ));
        }
        if config.access_secret == config.refresh_secret {
            return Err(AuthError::Configuration(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        Ok(Self {
            access: ScopeKeys::new(&config.access_secret, config.access_ttl),
            refresh: ScopeKeys::new(&config.refresh_secret, config.refresh_ttl),
            issuer: config.issuer,
        })
    }

    fn keys(&self, scope: TokenScope) -> &ScopeKeys {
        match scope {
            TokenScope::Access => &self.access,
            TokenScope::Refresh => &self.refresh,
        }
    }

    fn sign(&self, scope: TokenScope, identity: &Identity) -> Result<String, AuthError> {
        let keys = self.keys(scope);
        let now = Utc::now();
        let exp = now + keys.ttl;

        let claims = Claims {
            sub: identity.id.to_string(),
            handle: match scope {
                TokenScope::Access => Some(identity.handle.clone()),
                TokenScope::Refresh => None,
            },
            typ: scope.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl CredentialCodec for JwtCredentialCodec {
    fn issue(&self, identity: &Identity) -> Result<CredentialPair, AuthError> {
        Ok(CredentialPair {
            access_token: self.sign(TokenScope::Access, identity)?,
            refresh_token: self.sign(TokenScope::Refresh, identity)?,
            access_expires_in: self.access.ttl.num_seconds(),
            refresh_expires_in: self.refresh.ttl.num_seconds(),
        })
    }

    fn verify(&self, token: &str, expected: TokenScope) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.keys(expected).decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::Malformed(e.to_string()),
            })?;
        let claims = token_data.claims;

        if claims.typ != expected.as_str() {
            return Err(AuthError::WrongScope {
                expected,
                found: claims.typ,
            });
        }

        let identity_id =
            Uuid::parse_str(&claims.sub).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let token_id =
            Uuid::parse_str(&claims.jti).map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(TokenClaims {
            identity_id,
            handle: claims.handle,
            scope: expected,
            token_id,
            expires_at: claims.exp,
        })
    }
}
