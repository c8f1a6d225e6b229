//! Articles and comments: creation, listing, authorship-checked edits.

use chrono::Utc;
use uuid::Uuid;

use super::{Deadline, Stores, projection};
use crate::domain::{
    Article, ArticleFilter, ArticleView, Caller, Comment, CommentView, Identity, Listing, Page,
    SlugAllocator, Viewer, normalize_handle, normalize_tags,
};
use crate::error::{DomainError, FieldError, RepoError};

#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
}

/// Partial article update. A title change keeps the slug unless `reslug`.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
    pub reslug: bool,
}

/// Listing filters expressed with public handles.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    pub page: Page,
}

pub struct ContentService {
    stores: Stores,
    slugs: SlugAllocator,
    deadline: Deadline,
}

impl ContentService {
    pub fn new(stores: Stores, slugs: SlugAllocator, deadline: Deadline) -> Self {
        Self {
            stores,
            slugs,
            deadline,
        }
    }

    pub async fn create_article(
        &self,
        caller: &Caller,
        input: NewArticle,
    ) -> Result<ArticleView, DomainError> {
        let mut errors = Vec::new();
        require(&mut errors, "title", &input.title);
        require(&mut errors, "description", &input.description);
        require(&mut errors, "body", &input.body);
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let author = self.actor(caller).await?;
        let mut article = Article::new(
            author.id,
            String::new(),
            input.title.trim().to_string(),
            input.description,
            input.body,
            input.tag_list,
        );
        let article = self.insert_with_fresh_slug(&mut article).await?;

        tracing::info!(
            article_id = %article.id,
            slug = %article.slug,
            author = %author.id,
            "Article created"
        );

        Ok(ArticleView {
            author: author.profile(false),
            favorited: false,
            article,
        })
    }

    pub async fn article(&self, viewer: &Viewer, slug: &str) -> Result<ArticleView, DomainError> {
        let article = self.article_by_slug(slug).await?;
        projection::article_view(&self.stores, self.deadline, viewer.identity_id(), article).await
    }

    /// Global listing, newest first. An unknown author or favoriter handle
    /// matches nothing.
    pub async fn list_articles(
        &self,
        viewer: &Viewer,
        query: ArticleQuery,
    ) -> Result<Listing<ArticleView>, DomainError> {
        let mut filter = ArticleFilter {
            tag: query.tag.filter(|t| !t.trim().is_empty()),
            ..ArticleFilter::default()
        };

        if let Some(handle) = query.author {
            match self.find_by_handle(&handle).await? {
                Some(author) => filter.author_id = Some(author.id),
                None => return Ok(empty_listing()),
            }
        }
        if let Some(handle) = query.favorited {
            match self.find_by_handle(&handle).await? {
                Some(favoriter) => filter.favorited_by = Some(favoriter.id),
                None => return Ok(empty_listing()),
            }
        }

        self.listing(viewer.identity_id(), &filter, query.page)
            .await
    }

    /// Articles by authors the caller follows, newest first.
    pub async fn feed(
        &self,
        caller: &Caller,
        page: Page,
    ) -> Result<Listing<ArticleView>, DomainError> {
        let actor = self.actor(caller).await?;
        let filter = ArticleFilter {
            followed_by: Some(actor.id),
            ..ArticleFilter::default()
        };
        self.listing(Some(actor.id), &filter, page).await
    }

    pub async fn update_article(
        &self,
        caller: &Caller,
        slug: &str,
        changes: ArticleChanges,
    ) -> Result<ArticleView, DomainError> {
        let mut article = self.article_by_slug(slug).await?;
        if !article.is_authored_by(caller.identity_id) {
            return Err(DomainError::Forbidden(
                "only the author can edit this article".to_string(),
            ));
        }

        let mut errors = Vec::new();
        if let Some(title) = changes.title {
            require(&mut errors, "title", &title);
            article.title = title.trim().to_string();
        }
        if let Some(description) = changes.description {
            require(&mut errors, "description", &description);
            article.description = description;
        }
        if let Some(body) = changes.body {
            require(&mut errors, "body", &body);
            article.body = body;
        }
        if let Some(tags) = changes.tag_list {
            article.tag_list = normalize_tags(tags);
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        article.updated_at = Utc::now();
        let article = if changes.reslug {
            let previous = article.slug.clone();
            let article = self.save_with_fresh_slug(&mut article).await?;
            tracing::info!(from = %previous, to = %article.slug, "Article reslugged");
            article
        } else {
            self.deadline
                .run(self.stores.articles.save(article))
                .await
                .map_err(|e| vanished(e, "article", slug))?
        };

        tracing::debug!(article_id = %article.id, "Article updated");
        projection::article_view(&self.stores, self.deadline, Some(caller.identity_id), article)
            .await
    }

    /// Delete an article together with its comments and favorites.
    pub async fn delete_article(&self, caller: &Caller, slug: &str) -> Result<(), DomainError> {
        let article = self.article_by_slug(slug).await?;
        if !article.is_authored_by(caller.identity_id) {
            return Err(DomainError::Forbidden(
                "only the author can delete this article".to_string(),
            ));
        }

        self.deadline
            .run(self.stores.articles.delete(article.id))
            .await
            .map_err(|e| vanished(e, "article", slug))?;

        tracing::info!(article_id = %article.id, slug = %article.slug, "Article deleted");
        Ok(())
    }

    pub async fn add_comment(
        &self,
        caller: &Caller,
        slug: &str,
        body: String,
    ) -> Result<CommentView, DomainError> {
        if body.trim().is_empty() {
            return Err(DomainError::invalid("body", "can't be blank"));
        }
        let article = self.article_by_slug(slug).await?;
        let author = self.actor(caller).await?;

        let comment = self
            .deadline
            .run(
                self.stores
                    .comments
                    .insert(Comment::new(article.id, author.id, body)),
            )
            .await
            .map_err(|e| vanished(e, "article", slug))?;

        tracing::debug!(comment_id = %comment.id, article_id = %article.id, "Comment added");
        Ok(CommentView {
            comment,
            author: author.profile(false),
        })
    }

    /// Comments of an article in creation order.
    pub async fn comments(
        &self,
        viewer: &Viewer,
        slug: &str,
    ) -> Result<Vec<CommentView>, DomainError> {
        let article = self.article_by_slug(slug).await?;
        let comments = self
            .deadline
            .run(self.stores.comments.list_for_article(article.id))
            .await?;

        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(
                projection::comment_view(
                    &self.stores,
                    self.deadline,
                    viewer.identity_id(),
                    comment,
                )
                .await?,
            );
        }
        Ok(views)
    }

    pub async fn delete_comment(
        &self,
        caller: &Caller,
        slug: &str,
        comment_id: Uuid,
    ) -> Result<(), DomainError> {
        let article = self.article_by_slug(slug).await?;
        let comment = self
            .deadline
            .run(self.stores.comments.find_by_id(comment_id))
            .await?
            .filter(|c| c.article_id == article.id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;

        if comment.author_id != caller.identity_id {
            return Err(DomainError::Forbidden(
                "only the author can delete this comment".to_string(),
            ));
        }

        self.deadline
            .run(self.stores.comments.delete(comment.id))
            .await
            .map_err(|e| vanished(e, "comment", comment_id))?;

        tracing::debug!(comment_id = %comment_id, article_id = %article.id, "Comment deleted");
        Ok(())
    }

    pub async fn tags(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.deadline.run(self.stores.articles.tags()).await?)
    }

    async fn listing(
        &self,
        viewer: Option<Uuid>,
        filter: &ArticleFilter,
        page: Page,
    ) -> Result<Listing<ArticleView>, DomainError> {
        let listing = self
            .deadline
            .run(self.stores.articles.list(filter, page))
            .await?;

        let mut items = Vec::with_capacity(listing.items.len());
        for article in listing.items {
            items.push(projection::article_view(&self.stores, self.deadline, viewer, article).await?);
        }
        Ok(Listing {
            items,
            total: listing.total,
        })
    }

    /// Insert, moving to the next slug candidate whenever the store reports
    /// a slug already taken.
    async fn insert_with_fresh_slug(&self, article: &mut Article) -> Result<Article, DomainError> {
        let now = Utc::now();
        for attempt in 0..self.slugs.max_attempts() {
            article.slug = self.slugs.candidate(&article.title, now, attempt);
            match self
                .deadline
                .run(self.stores.articles.insert(article.clone()))
                .await
            {
                Ok(saved) => return Ok(saved),
                Err(RepoError::Constraint(_)) => {
                    tracing::debug!(slug = %article.slug, attempt, "Slug taken, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(DomainError::conflict("slug"))
    }

    async fn save_with_fresh_slug(&self, article: &mut Article) -> Result<Article, DomainError> {
        let now = Utc::now();
        for attempt in 0..self.slugs.max_attempts() {
            article.slug = self.slugs.candidate(&article.title, now, attempt);
            match self
                .deadline
                .run(self.stores.articles.save(article.clone()))
                .await
            {
                Ok(saved) => return Ok(saved),
                Err(RepoError::Constraint(_)) => {
                    tracing::debug!(slug = %article.slug, attempt, "Slug taken, retrying");
                }
                Err(other) => return Err(vanished(other, "article", article.id)),
            }
        }
        Err(DomainError::conflict("slug"))
    }

    async fn actor(&self, caller: &Caller) -> Result<Identity, DomainError> {
        self.deadline
            .run(self.stores.identities.find_by_id(caller.identity_id))
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<Identity>, DomainError> {
        Ok(self
            .deadline
            .run(self.stores.identities.find_by_handle(&normalize_handle(handle)))
            .await?)
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Article, DomainError> {
        self.deadline
            .run(self.stores.articles.find_by_slug(slug))
            .await?
            .ok_or_else(|| DomainError::not_found("article", slug))
    }
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "can't be blank"));
    }
}

fn empty_listing<T>() -> Listing<T> {
    Listing {
        items: Vec::new(),
        total: 0,
    }
}

fn vanished(err: RepoError, entity_type: &'static str, key: impl ToString) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found(entity_type, key),
        other => other.into(),
    }
}
