//! Account lifecycle: registration, login, credential rotation and the
//! required/optional resolution of a caller from an access token.

use std::sync::Arc;

use chrono::Utc;

use super::{Deadline, Stores};
use crate::domain::{
    Caller, Identity, Session, TokenScope, Viewer, is_valid_contact, mask_contact,
    normalize_contact, normalize_handle,
};
use crate::error::{DomainError, FieldError};
use crate::ports::{AuthError, CredentialCodec, PasswordService};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Input for a new account.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub handle: String,
    pub name: String,
    pub contact: String,
    pub password: String,
}

/// Partial update of the current identity. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityChanges {
    pub handle: Option<String>,
    pub contact: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
}

pub struct AccountService {
    stores: Stores,
    codec: Arc<dyn CredentialCodec>,
    passwords: Arc<dyn PasswordService>,
    deadline: Deadline,
    /// Hash checked when a login names no known identity, so both failure
    /// branches do the same work.
    decoy_hash: String,
}

impl AccountService {
    pub fn new(
        stores: Stores,
        codec: Arc<dyn CredentialCodec>,
        passwords: Arc<dyn PasswordService>,
        deadline: Deadline,
    ) -> Result<Self, AuthError> {
        let decoy_hash = passwords.hash("decoy-password-never-matches")?;
        Ok(Self {
            stores,
            codec,
            passwords,
            deadline,
            decoy_hash,
        })
    }

    /// Create an identity and open a session for it.
    pub async fn register(&self, registration: Registration) -> Result<Session, DomainError> {
        let handle = normalize_handle(&registration.handle);
        let contact = normalize_contact(&registration.contact);
        let name = registration.name.trim().to_string();

        let mut errors = Vec::new();
        if handle.is_empty() {
            errors.push(FieldError::new("handle", "can't be blank"));
        }
        if name.is_empty() {
            errors.push(FieldError::new("name", "can't be blank"));
        }
        if contact.is_empty() {
            errors.push(FieldError::new("contact", "can't be blank"));
        } else if !is_valid_contact(&contact) {
            errors.push(FieldError::new("contact", "is invalid"));
        }
        if registration.password.is_empty() {
            errors.push(FieldError::new("password", "can't be blank"));
        } else if registration.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        self.ensure_handle_free(&handle, None).await?;
        self.ensure_contact_free(&contact, None).await?;

        let password_hash = self.hash_password(&registration.password)?;
        let identity = Identity::new(&handle, &contact, name, password_hash);
        let identity = self
            .deadline
            .run(self.stores.identities.insert(identity))
            .await?;

        tracing::info!(
            identity_id = %identity.id,
            handle = %identity.handle,
            contact = %mask_contact(&identity.contact),
            "Identity registered"
        );

        self.open_session(identity)
    }

    /// Authenticate with a handle or contact address and a password.
    ///
    /// Unknown identity and wrong password produce the same error.
    pub async fn login(&self, login: &str, password: &str) -> Result<Session, DomainError> {
        let login = login.trim().to_lowercase();
        let mut errors = Vec::new();
        if login.is_empty() {
            errors.push(FieldError::new("login", "can't be blank"));
        }
        if password.is_empty() {
            errors.push(FieldError::new("password", "can't be blank"));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let found = self
            .deadline
            .run(self.stores.identities.find_by_handle_or_contact(&login))
            .await?;

        let hash = found
            .as_ref()
            .map_or(self.decoy_hash.as_str(), |identity| identity.password_hash.as_str());
        let matches = self.verify_password(password, hash)?;

        match found {
            Some(identity) if matches => {
                tracing::info!(identity_id = %identity.id, "Login succeeded");
                self.open_session(identity)
            }
            _ => {
                tracing::debug!("Login rejected");
                Err(DomainError::Unauthenticated)
            }
        }
    }

    /// Rotate credentials: a valid refresh token yields a brand-new pair.
    ///
    /// The presented refresh token stays valid until it expires; there is no
    /// server-side registry to revoke it.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<Session, DomainError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(DomainError::Unauthenticated)?;

        let claims = self
            .codec
            .verify(token, TokenScope::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh credential rejected");
                auth_to_domain(e)
            })?;

        let identity = self
            .deadline
            .run(self.stores.identities.find_by_id(claims.identity_id))
            .await?
            .ok_or_else(|| {
                tracing::info!(identity_id = %claims.identity_id, "Refresh for missing identity");
                DomainError::Unauthenticated
            })?;

        tracing::debug!(identity_id = %identity.id, "Credentials rotated");
        self.open_session(identity)
    }

    /// Required authentication: a missing or invalid access token is an error.
    pub fn authenticate(&self, access_token: Option<&str>) -> Result<Caller, DomainError> {
        let token = access_token
            .filter(|t| !t.is_empty())
            .ok_or(DomainError::Unauthenticated)?;

        let claims = self
            .codec
            .verify(token, TokenScope::Access)
            .map_err(auth_to_domain)?;

        Caller::from_access_claims(claims).ok_or(DomainError::Unauthenticated)
    }

    /// Optional authentication: anything short of a valid access token is
    /// an anonymous viewer, never an error.
    pub fn viewer(&self, access_token: Option<&str>) -> Viewer {
        match self.authenticate(access_token) {
            Ok(caller) => Viewer::Authenticated(caller),
            Err(_) => Viewer::Anonymous,
        }
    }

    /// The caller's own identity record.
    pub async fn current(&self, caller: &Caller) -> Result<Identity, DomainError> {
        self.deadline
            .run(self.stores.identities.find_by_id(caller.identity_id))
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    /// Apply profile changes. A new pair is issued because the access token
    /// embeds the handle.
    pub async fn update(
        &self,
        caller: &Caller,
        changes: IdentityChanges,
    ) -> Result<Session, DomainError> {
        let mut identity = self.current(caller).await?;
        let mut errors = Vec::new();

        if let Some(handle) = changes.handle.as_deref().map(normalize_handle) {
            if handle.is_empty() {
                errors.push(FieldError::new("handle", "can't be blank"));
            } else if handle != identity.handle {
                self.ensure_handle_free(&handle, Some(identity.id)).await?;
                identity.handle = handle;
            }
        }
        if let Some(contact) = changes.contact.as_deref().map(normalize_contact) {
            if !is_valid_contact(&contact) {
                errors.push(FieldError::new("contact", "is invalid"));
            } else if contact != identity.contact {
                self.ensure_contact_free(&contact, Some(identity.id)).await?;
                identity.contact = contact;
            }
        }
        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                errors.push(FieldError::new("name", "can't be blank"));
            } else {
                identity.name = name;
            }
        }
        if let Some(bio) = changes.bio {
            identity.bio = bio;
        }
        if let Some(image) = changes.image {
            identity.image = image;
        }
        if let Some(password) = changes.password {
            if password.chars().count() < MIN_PASSWORD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!("must be at least {MIN_PASSWORD_LEN} characters"),
                ));
            } else {
                identity.password_hash = self.hash_password(&password)?;
            }
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        identity.updated_at = Utc::now();
        let identity = self
            .deadline
            .run(self.stores.identities.save(identity))
            .await?;

        tracing::info!(identity_id = %identity.id, "Identity updated");
        self.open_session(identity)
    }

    fn open_session(&self, identity: Identity) -> Result<Session, DomainError> {
        let credentials = self.codec.issue(&identity).map_err(auth_to_domain)?;
        Ok(Session {
            identity,
            credentials,
        })
    }

    async fn ensure_handle_free(
        &self,
        handle: &str,
        owner: Option<uuid::Uuid>,
    ) -> Result<(), DomainError> {
        let existing = self
            .deadline
            .run(self.stores.identities.find_by_handle(handle))
            .await?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(DomainError::conflict("handle")),
            _ => Ok(()),
        }
    }

    async fn ensure_contact_free(
        &self,
        contact: &str,
        owner: Option<uuid::Uuid>,
    ) -> Result<(), DomainError> {
        let existing = self
            .deadline
            .run(self.stores.identities.find_by_contact(contact))
            .await?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(DomainError::conflict("contact")),
            _ => Ok(()),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        self.passwords.hash(password).map_err(auth_to_domain)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        self.passwords.verify(password, hash).map_err(auth_to_domain)
    }
}

/// Bad credentials become `Unauthenticated`; codec/hash failures are upstream.
fn auth_to_domain(err: AuthError) -> DomainError {
    if err.is_unauthenticated() {
        DomainError::Unauthenticated
    } else {
        tracing::error!(error = %err, "Credential subsystem failure");
        DomainError::Upstream {
            message: err.to_string(),
            retryable: false,
        }
    }
}

