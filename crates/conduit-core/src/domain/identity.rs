use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Avatar assigned to identities that never uploaded one.
pub const DEFAULT_AVATAR: &str =
    "https://cdn.pixabay.com/photo/2016/08/08/09/17/avatar-1577909_1280.png";

/// Identity entity - a registered author/reader.
///
/// `handle` and `contact` are stored case-normalized; use [`normalize_handle`]
/// and [`normalize_contact`] before any lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub handle: String,
    pub contact: String,
    pub name: String,
    pub password_hash: String,
    pub bio: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new identity with generated ID and timestamps.
    pub fn new(handle: &str, contact: &str, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            handle: normalize_handle(handle),
            contact: normalize_contact(contact),
            name,
            password_hash,
            bio: String::new(),
            image: DEFAULT_AVATAR.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection of this identity as seen by `following`-aware viewers.
    pub fn profile(&self, following: bool) -> Profile {
        Profile {
            handle: self.handle.clone(),
            name: self.name.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
            following,
        }
    }
}

/// Public view of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub handle: String,
    pub name: String,
    pub bio: String,
    pub image: String,
    pub following: bool,
}

pub fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_contact(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Loose `local@domain.tld` shape check.
pub fn is_valid_contact(contact: &str) -> bool {
    if contact.chars().any(char::is_whitespace) {
        return false;
    }
    match contact.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Mask a contact address for logs (`a***@example.com`).
pub fn mask_contact(contact: &str) -> String {
    match contact.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identity_normalizes_handle_and_contact() {
        let identity = Identity::new(
            "  Alice ",
            "Alice@Example.COM",
            "Alice".to_string(),
            "hash".to_string(),
        );

        assert_eq!(identity.handle, "alice");
        assert_eq!(identity.contact, "alice@example.com");
        assert_eq!(identity.image, DEFAULT_AVATAR);
        assert!(identity.bio.is_empty());
    }

    #[test]
    fn contact_shape() {
        assert!(is_valid_contact("a@b.co"));
        assert!(!is_valid_contact("a@b"));
        assert!(!is_valid_contact("@b.co"));
        assert!(!is_valid_contact("a b@c.de"));
        assert!(!is_valid_contact("plain"));
    }

    #[test]
    fn masks_local_part() {
        assert_eq!(mask_contact("alice@example.com"), "a***@example.com");
        assert_eq!(mask_contact("a@example.com"), "***@example.com");
        assert_eq!(mask_contact("nope"), "***");
    }
}
