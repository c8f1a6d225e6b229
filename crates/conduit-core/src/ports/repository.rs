use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Article, ArticleFilter, Comment, Identity, Listing, Page};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Uniqueness violations yield `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Persist changes to an existing entity.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Identity store.
#[async_trait]
pub trait IdentityRepository: BaseRepository<Identity, Uuid> {
    /// Lookup by normalized handle.
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Identity>, RepoError>;

    /// Lookup by normalized contact address.
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Identity>, RepoError>;

    /// Lookup where `value` matches either the handle or the contact address.
    async fn find_by_handle_or_contact(&self, value: &str)
    -> Result<Option<Identity>, RepoError>;
}

/// Article store.
///
/// `save` must not overwrite `favorites_count`; the counter is only written
/// through `adjust_favorites_count` and `set_favorites_count`. `delete`
/// cascades to the article's comments and to favorites memberships.
#[async_trait]
pub trait ArticleRepository: BaseRepository<Article, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepoError>;

    /// Matching articles, newest first, with the total match count.
    async fn list(&self, filter: &ArticleFilter, page: Page)
    -> Result<Listing<Article>, RepoError>;

    /// Distinct tags across all articles, sorted.
    async fn tags(&self) -> Result<Vec<String>, RepoError>;

    /// IDs of every article, for maintenance passes.
    async fn all_ids(&self) -> Result<Vec<Uuid>, RepoError>;

    /// Atomically add `delta` to the counter, clamping at zero. Returns the new value.
    async fn adjust_favorites_count(&self, id: Uuid, delta: i64) -> Result<u64, RepoError>;

    /// Overwrite the counter. Returns the previous value.
    async fn set_favorites_count(&self, id: Uuid, count: u64) -> Result<u64, RepoError>;
}

/// Comment store.
///
/// `insert` fails with `RepoError::NotFound` when the parent article is gone;
/// `insert` and `delete` update the parent's ordered comment list together
/// with the comment record.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of an article in creation order.
    async fn list_for_article(&self, article_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

/// Follow and favorite memberships.
///
/// Each toggle flips one identity's membership atomically and returns the
/// resulting state (`true` = now following / favorited).
#[async_trait]
pub trait GraphRepository: Send + Sync {
    async fn toggle_follow(&self, follower: Uuid, target: Uuid) -> Result<bool, RepoError>;

    async fn is_following(&self, follower: Uuid, target: Uuid) -> Result<bool, RepoError>;

    async fn toggle_favorite(&self, identity: Uuid, article: Uuid) -> Result<bool, RepoError>;

    async fn is_favorited(&self, identity: Uuid, article: Uuid) -> Result<bool, RepoError>;

    /// Number of identities whose favorites contain `article`.
    async fn count_favoriters(&self, article: Uuid) -> Result<u64, RepoError>;
}
