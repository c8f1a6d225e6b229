use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Profile;

/// Comment entity - owned by exactly one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub article_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(article_id: Uuid, author_id: Uuid, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            body,
            author_id,
            article_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Comment with its author's profile projected for a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Profile,
}
