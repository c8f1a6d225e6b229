use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Profile;

/// Article entity - a piece of published content addressed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub author_id: Uuid,
    /// Cached count of identities favoriting this article. Membership is the
    /// source of truth; see `SocialGraph::reconcile_article`.
    pub favorites_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create a new article owned by `author_id`.
    pub fn new(
        author_id: Uuid,
        slug: String,
        title: String,
        description: String,
        body: String,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug,
            title,
            description,
            body,
            tag_list: normalize_tags(tags),
            author_id,
            favorites_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, identity_id: Uuid) -> bool {
        self.author_id == identity_id
    }
}

/// Trim tags, drop empty ones and remove duplicates keeping first occurrence.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Article as presented to a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleView {
    pub article: Article,
    pub author: Profile,
    pub favorited: bool,
}

/// Filters accepted by article listings. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub tag: Option<String>,
    pub author_id: Option<Uuid>,
    pub favorited_by: Option<Uuid>,
    /// Restrict to authors followed by this identity (the personal feed).
    pub followed_by: Option<Uuid>,
}

/// Limit/offset window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}
