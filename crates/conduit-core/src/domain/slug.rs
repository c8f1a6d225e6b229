//! Slug allocation for articles.
//!
//! A slug is `<slugified title>-<6 digits>`. The digits come from the current
//! Unix time in milliseconds; the store's unique index is what actually
//! guarantees uniqueness, and callers retry with [`SlugAllocator::candidate`]
//! for the next attempt when an insert reports a slug conflict.

use chrono::{DateTime, Utc};

const FALLBACK_BASE: &str = "article";
const SUFFIX_MODULUS: i64 = 1_000_000;

/// Lowercase, ASCII, hyphen-delimited form of `title`.
///
/// Runs of anything that is not an ASCII letter or digit collapse into a
/// single hyphen; quotes are dropped so "Don't" becomes "dont".
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else if matches!(ch, '\'' | '"' | '\u{2019}') {
            continue;
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        slug
    }
}

/// Produces slug candidates for a title.
#[derive(Debug, Clone)]
pub struct SlugAllocator {
    max_attempts: u32,
}

impl SlugAllocator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Candidate for the given attempt (0-based) at time `now`.
    pub fn candidate(&self, title: &str, now: DateTime<Utc>, attempt: u32) -> String {
        let suffix = (now.timestamp_millis() + i64::from(attempt)).rem_euclid(SUFFIX_MODULUS);
        format!("{}-{:06}", slugify(title), suffix)
    }
}

impl Default for SlugAllocator {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust -- is  FUN!! "), "rust-is-fun");
        assert_eq!(slugify("Don't panic"), "dont-panic");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify("!!!"), "article");
        assert_eq!(slugify(""), "article");
    }

    #[test]
    fn candidate_uses_last_six_millisecond_digits() {
        let now = Utc.timestamp_millis_opt(1_700_000_123_456).unwrap();
        let allocator = SlugAllocator::default();

        assert_eq!(allocator.candidate("Hello World", now, 0), "hello-world-123456");
        assert_eq!(allocator.candidate("Hello World", now, 1), "hello-world-123457");
    }

    #[test]
    fn candidate_suffix_wraps_to_six_digits() {
        let now = Utc.timestamp_millis_opt(1_700_000_999_999).unwrap();
        let allocator = SlugAllocator::default();

        assert_eq!(allocator.candidate("x", now, 1), "x-000000");
        assert_eq!(allocator.candidate("x", now, 3), "x-000002");
    }
}
