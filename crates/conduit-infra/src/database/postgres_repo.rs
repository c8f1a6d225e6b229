//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, DbBackend, DbConn, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use conduit_core::domain::{
    Article, ArticleFilter, Comment, Identity, Listing, Page, mask_contact,
};
use conduit_core::error::RepoError;
use conduit_core::ports::{
    ArticleRepository, CommentRepository, GraphRepository, IdentityRepository,
};

use super::entity::article::{self, Entity as ArticleEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::favorite::{self, Entity as FavoriteEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL identity repository.
pub type PostgresIdentityRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL article repository.
pub type PostgresArticleRepository = PostgresBaseRepository<ArticleEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Identity>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Handle.eq(handle))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_contact(&self, contact: &str) -> Result<Option<Identity>, RepoError> {
        tracing::debug!(contact = %mask_contact(contact), "Finding identity by contact");

        let result = UserEntity::find()
            .filter(user::Column::Contact.eq(contact))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_handle_or_contact(
        &self,
        value: &str,
    ) -> Result<Option<Identity>, RepoError> {
        let result = UserEntity::find()
            .filter(
                user::Column::Handle
                    .eq(value)
                    .or(user::Column::Contact.eq(value)),
            )
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[derive(Debug, FromQueryResult)]
struct TagRow {
    tag: String,
}

#[async_trait]
impl ArticleRepository for PostgresArticleRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepoError> {
        let result = ArticleEntity::find()
            .filter(article::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        page: Page,
    ) -> Result<Listing<Article>, RepoError> {
        let mut query = ArticleEntity::find();

        if let Some(tag) = &filter.tag {
            query = query.filter(Expr::cust_with_values("$1 = ANY(tag_list)", [tag.clone()]));
        }
        if let Some(author_id) = filter.author_id {
            query = query.filter(article::Column::AuthorId.eq(author_id));
        }
        if let Some(identity_id) = filter.favorited_by {
            query = query.filter(
                article::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite::Column::ArticleId)
                        .from(FavoriteEntity)
                        .and_where(favorite::Column::IdentityId.eq(identity_id))
                        .to_owned(),
                ),
            );
        }
        if let Some(follower_id) = filter.followed_by {
            query = query.filter(
                article::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::TargetId)
                        .from(FollowEntity)
                        .and_where(follow::Column::FollowerId.eq(follower_id))
                        .to_owned(),
                ),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(map_db_err)?;
        let items = query
            .order_by_desc(article::Column::CreatedAt)
            .order_by_desc(article::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Listing {
            items: items.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn tags(&self) -> Result<Vec<String>, RepoError> {
        let rows = TagRow::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            "SELECT DISTINCT unnest(tag_list) AS tag FROM articles ORDER BY tag",
        ))
        .all(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|row| row.tag).collect())
    }

    async fn all_ids(&self) -> Result<Vec<Uuid>, RepoError> {
        ArticleEntity::find()
            .select_only()
            .column(article::Column::Id)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn adjust_favorites_count(&self, id: Uuid, delta: i64) -> Result<u64, RepoError> {
        let updated = ArticleEntity::update_many()
            .col_expr(
                article::Column::FavoritesCount,
                Expr::cust_with_values("GREATEST(favorites_count + $1, 0)", [delta]),
            )
            .filter(article::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        updated
            .into_iter()
            .next()
            .map(|model| u64::try_from(model.favorites_count).unwrap_or(0))
            .ok_or(RepoError::NotFound)
    }

    async fn set_favorites_count(&self, id: Uuid, count: u64) -> Result<u64, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let current = ArticleEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        ArticleEntity::update_many()
            .col_expr(
                article::Column::FavoritesCount,
                Expr::value(i64::try_from(count).unwrap_or(i64::MAX)),
            )
            .filter(article::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(u64::try_from(current.favorites_count).unwrap_or(0))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_article(&self, article_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// PostgreSQL follow/favorite membership store.
///
/// Each toggle runs in one transaction: insert-if-absent, and delete when
/// the row already existed.
pub struct PostgresGraphRepository {
    db: DbConn,
}

impl PostgresGraphRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GraphRepository for PostgresGraphRepository {
    async fn toggle_follow(&self, follower: Uuid, target: Uuid) -> Result<bool, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let inserted = FollowEntity::insert(follow::ActiveModel {
            follower_id: Set(follower),
            target_id: Set(target),
            created_at: Set(Utc::now().into()),
        })
        .on_conflict(
            OnConflict::columns([follow::Column::FollowerId, follow::Column::TargetId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(map_db_err)?;

        if inserted == 0 {
            FollowEntity::delete_many()
                .filter(follow::Column::FollowerId.eq(follower))
                .filter(follow::Column::TargetId.eq(target))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(inserted > 0)
    }

    async fn is_following(&self, follower: Uuid, target: Uuid) -> Result<bool, RepoError> {
        let row = FollowEntity::find_by_id((follower, target))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    async fn toggle_favorite(&self, identity: Uuid, article: Uuid) -> Result<bool, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let inserted = FavoriteEntity::insert(favorite::ActiveModel {
            identity_id: Set(identity),
            article_id: Set(article),
            created_at: Set(Utc::now().into()),
        })
        .on_conflict(
            OnConflict::columns([favorite::Column::IdentityId, favorite::Column::ArticleId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(map_db_err)?;

        if inserted == 0 {
            FavoriteEntity::delete_many()
                .filter(favorite::Column::IdentityId.eq(identity))
                .filter(favorite::Column::ArticleId.eq(article))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(inserted > 0)
    }

    async fn is_favorited(&self, identity: Uuid, article: Uuid) -> Result<bool, RepoError> {
        let row = FavoriteEntity::find_by_id((identity, article))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    async fn count_favoriters(&self, article: Uuid) -> Result<u64, RepoError> {
        FavoriteEntity::find()
            .filter(favorite::Column::ArticleId.eq(article))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}
