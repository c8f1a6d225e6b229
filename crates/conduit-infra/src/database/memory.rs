//! In-memory store - used when no database is configured.
//!
//! Every repository port is implemented on one [`InMemoryStore`]. Mutations
//! are serialized per record: each identity's memberships and each article
//! (with its ordered comment list) sit behind their own async mutex, so
//! toggles on different records never wait on each other.
//!
//! Lock order is articles table -> article record -> comments map.
//! Identity locks are never held while an article lock is taken.
//! Data is lost on process restart.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use conduit_core::domain::{Article, ArticleFilter, Comment, Identity, Listing, Page};
use conduit_core::error::RepoError;
use conduit_core::ports::{
    ArticleRepository, BaseRepository, CommentRepository, GraphRepository, IdentityRepository,
};

#[derive(Default)]
struct Memberships {
    following: HashSet<Uuid>,
    favorites: HashSet<Uuid>,
}

struct IdentityRecord {
    identity: Identity,
    memberships: Arc<Mutex<Memberships>>,
}

struct ArticleRecord {
    article: Article,
    comment_ids: Vec<Uuid>,
}

#[derive(Default)]
struct ArticleTable {
    by_id: HashMap<Uuid, Arc<Mutex<ArticleRecord>>>,
    by_slug: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct InMemoryStore {
    identities: RwLock<HashMap<Uuid, IdentityRecord>>,
    articles: RwLock<ArticleTable>,
    comments: RwLock<HashMap<Uuid, Comment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn memberships_of(&self, id: Uuid) -> Result<Arc<Mutex<Memberships>>, RepoError> {
        self.identities
            .read()
            .await
            .get(&id)
            .map(|record| record.memberships.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn article_record(&self, id: Uuid) -> Result<Arc<Mutex<ArticleRecord>>, RepoError> {
        self.articles
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn snapshot_articles(&self) -> Vec<Article> {
        let records: Vec<_> = self.articles.read().await.by_id.values().cloned().collect();
        let mut articles = Vec::with_capacity(records.len());
        for record in records {
            articles.push(record.lock().await.article.clone());
        }
        articles
    }

    fn check_identity_unique(
        table: &HashMap<Uuid, IdentityRecord>,
        candidate: &Identity,
    ) -> Result<(), RepoError> {
        for record in table.values().filter(|r| r.identity.id != candidate.id) {
            if record.identity.handle == candidate.handle {
                return Err(RepoError::Constraint("handle".to_string()));
            }
            if record.identity.contact == candidate.contact {
                return Err(RepoError::Constraint("contact".to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Identity, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, RepoError> {
        Ok(self
            .identities
            .read()
            .await
            .get(&id)
            .map(|r| r.identity.clone()))
    }

    async fn insert(&self, identity: Identity) -> Result<Identity, RepoError> {
        let mut table = self.identities.write().await;
        if table.contains_key(&identity.id) {
            return Err(RepoError::Constraint("id".to_string()));
        }
        Self::check_identity_unique(&table, &identity)?;

        table.insert(
            identity.id,
            IdentityRecord {
                identity: identity.clone(),
                memberships: Arc::default(),
            },
        );
        Ok(identity)
    }

    async fn save(&self, identity: Identity) -> Result<Identity, RepoError> {
        let mut table = self.identities.write().await;
        Self::check_identity_unique(&table, &identity)?;

        let record = table.get_mut(&identity.id).ok_or(RepoError::NotFound)?;
        record.identity = identity.clone();
        Ok(identity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut table = self.identities.write().await;
        if table.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for record in table.values() {
            record.memberships.lock().await.following.remove(&id);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Identity>, RepoError> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|r| r.identity.handle == handle)
            .map(|r| r.identity.clone()))
    }

    async fn find_by_contact(&self, contact: &str) -> Result<Option<Identity>, RepoError> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|r| r.identity.contact == contact)
            .map(|r| r.identity.clone()))
    }

    async fn find_by_handle_or_contact(
        &self,
        value: &str,
    ) -> Result<Option<Identity>, RepoError> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|r| r.identity.handle == value || r.identity.contact == value)
            .map(|r| r.identity.clone()))
    }
}

#[async_trait]
impl BaseRepository<Article, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepoError> {
        match self.article_record(id).await {
            Ok(record) => Ok(Some(record.lock().await.article.clone())),
            Err(RepoError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, article: Article) -> Result<Article, RepoError> {
        let mut table = self.articles.write().await;
        if table.by_slug.contains_key(&article.slug) {
            return Err(RepoError::Constraint("slug".to_string()));
        }
        if table.by_id.contains_key(&article.id) {
            return Err(RepoError::Constraint("id".to_string()));
        }

        table.by_slug.insert(article.slug.clone(), article.id);
        table.by_id.insert(
            article.id,
            Arc::new(Mutex::new(ArticleRecord {
                article: article.clone(),
                comment_ids: Vec::new(),
            })),
        );
        Ok(article)
    }

    async fn save(&self, article: Article) -> Result<Article, RepoError> {
        let mut table = self.articles.write().await;
        let record = table.by_id.get(&article.id).cloned().ok_or(RepoError::NotFound)?;
        let mut record = record.lock().await;

        if record.article.slug != article.slug {
            if table.by_slug.contains_key(&article.slug) {
                return Err(RepoError::Constraint("slug".to_string()));
            }
            table.by_slug.remove(&record.article.slug);
            table.by_slug.insert(article.slug.clone(), article.id);
        }

        let favorites_count = record.article.favorites_count;
        record.article = Article {
            favorites_count,
            ..article
        };
        Ok(record.article.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let comment_ids = {
            let mut table = self.articles.write().await;
            let record = table.by_id.remove(&id).ok_or(RepoError::NotFound)?;
            let record = record.lock().await;
            table.by_slug.remove(&record.article.slug);

            let mut comments = self.comments.write().await;
            for comment_id in &record.comment_ids {
                comments.remove(comment_id);
            }
            record.comment_ids.len()
        };

        let memberships: Vec<_> = self
            .identities
            .read()
            .await
            .values()
            .map(|r| r.memberships.clone())
            .collect();
        for membership in memberships {
            membership.lock().await.favorites.remove(&id);
        }

        tracing::debug!(article_id = %id, comments = comment_ids, "Article removed from memory store");
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepoError> {
        let record = {
            let table = self.articles.read().await;
            table
                .by_slug
                .get(slug)
                .and_then(|id| table.by_id.get(id))
                .cloned()
        };
        match record {
            Some(record) => Ok(Some(record.lock().await.article.clone())),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        page: Page,
    ) -> Result<Listing<Article>, RepoError> {
        let favorites = match filter.favorited_by {
            Some(id) => match self.memberships_of(id).await {
                Ok(m) => Some(m.lock().await.favorites.clone()),
                Err(_) => Some(HashSet::new()),
            },
            None => None,
        };
        let followed = match filter.followed_by {
            Some(id) => match self.memberships_of(id).await {
                Ok(m) => Some(m.lock().await.following.clone()),
                Err(_) => Some(HashSet::new()),
            },
            None => None,
        };

        let mut matches: Vec<Article> = self
            .snapshot_articles()
            .await
            .into_iter()
            .filter(|a| filter.tag.as_ref().is_none_or(|t| a.tag_list.contains(t)))
            .filter(|a| filter.author_id.is_none_or(|id| a.author_id == id))
            .filter(|a| favorites.as_ref().is_none_or(|set| set.contains(&a.id)))
            .filter(|a| followed.as_ref().is_none_or(|set| set.contains(&a.author_id)))
            .collect();

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .collect();

        Ok(Listing { items, total })
    }

    async fn tags(&self) -> Result<Vec<String>, RepoError> {
        let tags: BTreeSet<String> = self
            .snapshot_articles()
            .await
            .into_iter()
            .flat_map(|a| a.tag_list)
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn all_ids(&self) -> Result<Vec<Uuid>, RepoError> {
        Ok(self.articles.read().await.by_id.keys().copied().collect())
    }

    async fn adjust_favorites_count(&self, id: Uuid, delta: i64) -> Result<u64, RepoError> {
        let record = self.article_record(id).await?;
        let mut record = record.lock().await;

        let current = i64::try_from(record.article.favorites_count).unwrap_or(i64::MAX);
        let next = current.saturating_add(delta).max(0);
        record.article.favorites_count = next.unsigned_abs();
        Ok(record.article.favorites_count)
    }

    async fn set_favorites_count(&self, id: Uuid, count: u64) -> Result<u64, RepoError> {
        let record = self.article_record(id).await?;
        let mut record = record.lock().await;
        Ok(std::mem::replace(&mut record.article.favorites_count, count))
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let record = self.article_record(comment.article_id).await?;
        let mut record = record.lock().await;
        let mut comments = self.comments.write().await;
        if comments.contains_key(&comment.id) {
            return Err(RepoError::Constraint("id".to_string()));
        }

        comments.insert(comment.id, comment.clone());
        record.comment_ids.push(comment.id);
        Ok(comment)
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut comments = self.comments.write().await;
        let stored = comments.get_mut(&comment.id).ok_or(RepoError::NotFound)?;
        stored.body = comment.body;
        stored.updated_at = comment.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let article_id = self
            .comments
            .read()
            .await
            .get(&id)
            .map(|c| c.article_id)
            .ok_or(RepoError::NotFound)?;

        match self.article_record(article_id).await {
            Ok(record) => {
                // Both removals happen under the article lock, which readers
                // of the comment list also take.
                let mut record = record.lock().await;
                let mut comments = self.comments.write().await;
                if comments.remove(&id).is_none() {
                    return Err(RepoError::NotFound);
                }
                record.comment_ids.retain(|c| *c != id);
            }
            Err(RepoError::NotFound) => {
                self.comments.write().await.remove(&id);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_article(&self, article_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let record = match self.article_record(article_id).await {
            Ok(record) => record,
            Err(RepoError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let record = record.lock().await;
        let comments = self.comments.read().await;

        Ok(record
            .comment_ids
            .iter()
            .filter_map(|id| comments.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl GraphRepository for InMemoryStore {
    async fn toggle_follow(&self, follower: Uuid, target: Uuid) -> Result<bool, RepoError> {
        let memberships = {
            let table = self.identities.read().await;
            if !table.contains_key(&target) {
                return Err(RepoError::NotFound);
            }
            table
                .get(&follower)
                .map(|r| r.memberships.clone())
                .ok_or(RepoError::NotFound)?
        };

        let mut memberships = memberships.lock().await;
        Ok(flip(&mut memberships.following, target))
    }

    async fn is_following(&self, follower: Uuid, target: Uuid) -> Result<bool, RepoError> {
        match self.memberships_of(follower).await {
            Ok(m) => Ok(m.lock().await.following.contains(&target)),
            Err(RepoError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn toggle_favorite(&self, identity: Uuid, article: Uuid) -> Result<bool, RepoError> {
        if !self.articles.read().await.by_id.contains_key(&article) {
            return Err(RepoError::NotFound);
        }
        let memberships = self.memberships_of(identity).await?;
        let mut memberships = memberships.lock().await;
        Ok(flip(&mut memberships.favorites, article))
    }

    async fn is_favorited(&self, identity: Uuid, article: Uuid) -> Result<bool, RepoError> {
        match self.memberships_of(identity).await {
            Ok(m) => Ok(m.lock().await.favorites.contains(&article)),
            Err(RepoError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn count_favoriters(&self, article: Uuid) -> Result<u64, RepoError> {
        let memberships: Vec<_> = self
            .identities
            .read()
            .await
            .values()
            .map(|r| r.memberships.clone())
            .collect();

        let mut count = 0u64;
        for membership in memberships {
            if membership.lock().await.favorites.contains(&article) {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Insert if absent, remove if present. Returns membership after the flip.
fn flip(set: &mut HashSet<Uuid>, id: Uuid) -> bool {
    if set.remove(&id) {
        false
    } else {
        set.insert(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(handle: &str) -> Identity {
        Identity::new(
            handle,
            &format!("{handle}@example.com"),
            handle.to_string(),
            "hash".to_string(),
        )
    }

    fn article(author: Uuid, slug: &str, tags: &[&str]) -> Article {
        Article::new(
            author,
            slug.to_string(),
            slug.to_string(),
            "description".to_string(),
            "body".to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    async fn insert_identity(store: &InMemoryStore, handle: &str) -> Identity {
        BaseRepository::<Identity, Uuid>::insert(store, identity(handle))
            .await
            .unwrap()
    }

    async fn insert_article(store: &InMemoryStore, author: Uuid, slug: &str) -> Article {
        BaseRepository::<Article, Uuid>::insert(store, article(author, slug, &[]))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_handle_and_contact_are_constraints() {
        let store = InMemoryStore::new();
        insert_identity(&store, "alice").await;

        let mut same_handle = identity("alice");
        same_handle.contact = "other@example.com".to_string();
        let err = BaseRepository::<Identity, Uuid>::insert(&store, same_handle)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(f) if f == "handle"));

        let mut same_contact = identity("bob");
        same_contact.contact = "alice@example.com".to_string();
        let err = BaseRepository::<Identity, Uuid>::insert(&store, same_contact)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(f) if f == "contact"));
    }

    #[tokio::test]
    async fn test_find_by_handle_or_contact() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;

        let by_handle = store.find_by_handle_or_contact("alice").await.unwrap();
        let by_contact = store
            .find_by_handle_or_contact("alice@example.com")
            .await
            .unwrap();

        assert_eq!(by_handle.map(|i| i.id), Some(alice.id));
        assert_eq!(by_contact.map(|i| i.id), Some(alice.id));
        assert!(store.find_by_handle_or_contact("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slug_is_unique() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        insert_article(&store, alice.id, "hello-world-000001").await;

        let err = BaseRepository::<Article, Uuid>::insert(
            &store,
            article(alice.id, "hello-world-000001", &[]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RepoError::Constraint(f) if f == "slug"));
    }

    #[tokio::test]
    async fn test_save_keeps_counter() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        let stored = insert_article(&store, alice.id, "a-000001").await;
        store.adjust_favorites_count(stored.id, 1).await.unwrap();

        let mut edited = stored.clone();
        edited.title = "Edited".to_string();
        edited.favorites_count = 42;
        let saved = BaseRepository::<Article, Uuid>::save(&store, edited)
            .await
            .unwrap();

        assert_eq!(saved.title, "Edited");
        assert_eq!(saved.favorites_count, 1);
    }

    #[tokio::test]
    async fn test_counter_clamps_at_zero() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        let stored = insert_article(&store, alice.id, "a-000001").await;

        assert_eq!(store.adjust_favorites_count(stored.id, -1).await.unwrap(), 0);
        assert_eq!(store.adjust_favorites_count(stored.id, 1).await.unwrap(), 1);
        assert_eq!(store.set_favorites_count(stored.id, 5).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_toggle_follow_alternates() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        let bob = insert_identity(&store, "bob").await;

        assert!(store.toggle_follow(alice.id, bob.id).await.unwrap());
        assert!(store.is_following(alice.id, bob.id).await.unwrap());
        assert!(!store.is_following(bob.id, alice.id).await.unwrap());
        assert!(!store.toggle_follow(alice.id, bob.id).await.unwrap());
        assert!(!store.is_following(alice.id, bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_against_missing_records() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;

        let follow = store.toggle_follow(alice.id, Uuid::new_v4()).await;
        let favorite = store.toggle_favorite(alice.id, Uuid::new_v4()).await;

        assert!(matches!(follow, Err(RepoError::NotFound)));
        assert!(matches!(favorite, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        let bob = insert_identity(&store, "bob").await;

        let mut older = article(alice.id, "older-000001", &["rust"]);
        older.created_at -= chrono::TimeDelta::minutes(5);
        BaseRepository::<Article, Uuid>::insert(&store, older)
            .await
            .unwrap();
        let newer = BaseRepository::<Article, Uuid>::insert(
            &store,
            article(bob.id, "newer-000002", &["rust", "web"]),
        )
        .await
        .unwrap();

        let all = store
            .list(&ArticleFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.items[0].slug, "newer-000002");

        let tagged = store
            .list(
                &ArticleFilter {
                    tag: Some("web".to_string()),
                    ..ArticleFilter::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(tagged.total, 1);

        store.toggle_favorite(alice.id, newer.id).await.unwrap();
        let favorited = store
            .list(
                &ArticleFilter {
                    favorited_by: Some(alice.id),
                    ..ArticleFilter::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(favorited.items.len(), 1);
        assert_eq!(favorited.items[0].id, newer.id);

        store.toggle_follow(bob.id, alice.id).await.unwrap();
        let feed = store
            .list(
                &ArticleFilter {
                    followed_by: Some(bob.id),
                    ..ArticleFilter::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].slug, "older-000001");

        let paged = store
            .list(&ArticleFilter::default(), Page::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(paged.total, 2);
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.items[0].slug, "older-000001");

        assert_eq!(
            store.tags().await.unwrap(),
            vec!["rust".to_string(), "web".to_string()]
        );
    }

    #[tokio::test]
    async fn test_comment_delete_removes_record_and_reference() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        let post = insert_article(&store, alice.id, "post-000001").await;

        let first = BaseRepository::<Comment, Uuid>::insert(
            &store,
            Comment::new(post.id, alice.id, "first".to_string()),
        )
        .await
        .unwrap();
        let second = BaseRepository::<Comment, Uuid>::insert(
            &store,
            Comment::new(post.id, alice.id, "second".to_string()),
        )
        .await
        .unwrap();

        BaseRepository::<Comment, Uuid>::delete(&store, first.id)
            .await
            .unwrap();

        let remaining = store.list_for_article(post.id).await.unwrap();
        assert_eq!(remaining, vec![second]);
        assert!(
            BaseRepository::<Comment, Uuid>::find_by_id(&store, first.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_comment_on_missing_article_is_not_found() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;

        let result = BaseRepository::<Comment, Uuid>::insert(
            &store,
            Comment::new(Uuid::new_v4(), alice.id, "orphan".to_string()),
        )
        .await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_article_delete_cascades() {
        let store = InMemoryStore::new();
        let alice = insert_identity(&store, "alice").await;
        let post = insert_article(&store, alice.id, "post-000001").await;
        let comment = BaseRepository::<Comment, Uuid>::insert(
            &store,
            Comment::new(post.id, alice.id, "hi".to_string()),
        )
        .await
        .unwrap();
        store.toggle_favorite(alice.id, post.id).await.unwrap();

        BaseRepository::<Article, Uuid>::delete(&store, post.id)
            .await
            .unwrap();

        assert!(store.find_by_slug("post-000001").await.unwrap().is_none());
        assert!(
            BaseRepository::<Comment, Uuid>::find_by_id(&store, comment.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.is_favorited(alice.id, post.id).await.unwrap());
        assert_eq!(store.count_favoriters(post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_comment_deletes_keep_list_consistent() {
        let store = Arc::new(InMemoryStore::new());
        let alice = insert_identity(&store, "alice").await;
        let post = insert_article(&store, alice.id, "post-000001").await;

        let mut ids = Vec::new();
        for i in 0..20 {
            let comment = BaseRepository::<Comment, Uuid>::insert(
                store.as_ref(),
                Comment::new(post.id, alice.id, format!("comment {i}")),
            )
            .await
            .unwrap();
            ids.push(comment.id);
        }

        let deletes = ids.iter().step_by(2).map(|id| {
            let store = store.clone();
            let id = *id;
            tokio::spawn(
                async move { BaseRepository::<Comment, Uuid>::delete(store.as_ref(), id).await },
            )
        });
        for result in futures::future::join_all(deletes).await {
            result.unwrap().unwrap();
        }

        let listed = store.list_for_article(post.id).await.unwrap();
        assert_eq!(listed.len(), 10);
        for comment in &listed {
            assert!(
                BaseRepository::<Comment, Uuid>::find_by_id(store.as_ref(), comment.id)
                    .await
                    .unwrap()
                    .is_some()
            );
        }
    }
}
