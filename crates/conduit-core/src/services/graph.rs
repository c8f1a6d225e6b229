//! Social graph: follow/favorite toggles and favorite-counter reconciliation.

use uuid::Uuid;

use super::{Deadline, Stores, projection};
use crate::domain::{Article, ArticleView, Caller, Identity, Profile, Viewer, normalize_handle};
use crate::error::{DomainError, RepoError};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    Removed,
}

impl MembershipChange {
    fn from_state(now_member: bool) -> Self {
        if now_member {
            MembershipChange::Added
        } else {
            MembershipChange::Removed
        }
    }

    fn delta(self) -> i64 {
        match self {
            MembershipChange::Added => 1,
            MembershipChange::Removed => -1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FollowOutcome {
    pub profile: Profile,
    pub change: MembershipChange,
}

#[derive(Debug, Clone)]
pub struct FavoriteOutcome {
    pub article: ArticleView,
    pub change: MembershipChange,
}

/// Counter state of one article before and after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub article_id: Uuid,
    pub cached: u64,
    pub actual: u64,
}

impl Reconciliation {
    pub fn corrected(&self) -> bool {
        self.cached != self.actual
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub corrected: usize,
    pub failed: usize,
}

pub struct SocialGraph {
    stores: Stores,
    deadline: Deadline,
}

impl SocialGraph {
    pub fn new(stores: Stores, deadline: Deadline) -> Self {
        Self { stores, deadline }
    }

    /// Public profile of `handle`, with `following` relative to the viewer.
    pub async fn profile(&self, viewer: &Viewer, handle: &str) -> Result<Profile, DomainError> {
        let target = self.identity_by_handle(handle).await?;
        projection::profile(&self.stores, self.deadline, viewer.identity_id(), &target).await
    }

    /// Follow `handle` if not yet followed, otherwise unfollow.
    pub async fn toggle_follow(
        &self,
        caller: &Caller,
        handle: &str,
    ) -> Result<FollowOutcome, DomainError> {
        let target = self.identity_by_handle(handle).await?;
        let actor = self.actor(caller).await?;
        if actor.id == target.id {
            return Err(DomainError::invalid("handle", "cannot follow yourself"));
        }

        let following = self
            .deadline
            .run(self.stores.graph.toggle_follow(actor.id, target.id))
            .await
            .map_err(|e| missing_member(e, "identity", &target.handle))?;
        let change = MembershipChange::from_state(following);

        tracing::debug!(
            follower = %actor.id,
            target = %target.id,
            ?change,
            "Follow toggled"
        );

        Ok(FollowOutcome {
            profile: target.profile(following),
            change,
        })
    }

    /// Favorite the article if not yet favorited, otherwise unfavorite, and
    /// move the cached counter by one in the same direction.
    pub async fn toggle_favorite(
        &self,
        caller: &Caller,
        slug: &str,
    ) -> Result<FavoriteOutcome, DomainError> {
        let article = self.article_by_slug(slug).await?;
        let actor = self.actor(caller).await?;

        let favorited = self
            .deadline
            .run(self.stores.graph.toggle_favorite(actor.id, article.id))
            .await
            .map_err(|e| missing_member(e, "article", slug))?;
        let change = MembershipChange::from_state(favorited);

        let count = match self
            .deadline
            .run(
                self.stores
                    .articles
                    .adjust_favorites_count(article.id, change.delta()),
            )
            .await
        {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(
                    article_id = %article.id,
                    error = %err,
                    "Counter update failed after membership change, recounting"
                );
                self.reconcile_article(article.id).await?.actual
            }
        };

        tracing::debug!(
            identity = %actor.id,
            article = %article.id,
            ?change,
            favorites_count = count,
            "Favorite toggled"
        );

        let mut view =
            projection::article_view(&self.stores, self.deadline, Some(actor.id), article).await?;
        view.article.favorites_count = count;
        view.favorited = favorited;

        Ok(FavoriteOutcome {
            article: view,
            change,
        })
    }

    /// Recompute one article's counter from favorites membership.
    ///
    /// Idempotent: running it again without intervening toggles changes
    /// nothing.
    pub async fn reconcile_article(&self, article_id: Uuid) -> Result<Reconciliation, DomainError> {
        let actual = self
            .deadline
            .run(self.stores.graph.count_favoriters(article_id))
            .await?;
        let cached = self
            .deadline
            .run(self.stores.articles.set_favorites_count(article_id, actual))
            .await
            .map_err(|e| missing_member(e, "article", article_id))?;

        let outcome = Reconciliation {
            article_id,
            cached,
            actual,
        };
        if outcome.corrected() {
            tracing::info!(
                article_id = %article_id,
                cached,
                actual,
                "Favorites counter drift corrected"
            );
        }
        Ok(outcome)
    }

    /// Reconcile every article. Individual failures are counted, not fatal.
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, DomainError> {
        let ids = self.deadline.run(self.stores.articles.all_ids()).await?;
        let mut report = ReconcileReport::default();

        for id in ids {
            report.checked += 1;
            match self.reconcile_article(id).await {
                Ok(outcome) if outcome.corrected() => report.corrected += 1,
                Ok(_) => {}
                // Deleted between listing and recount.
                Err(DomainError::NotFound { .. }) => {}
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(article_id = %id, error = %err, "Reconciliation failed");
                }
            }
        }

        tracing::info!(
            checked = report.checked,
            corrected = report.corrected,
            failed = report.failed,
            "Favorites reconciliation finished"
        );
        Ok(report)
    }

    async fn actor(&self, caller: &Caller) -> Result<Identity, DomainError> {
        self.deadline
            .run(self.stores.identities.find_by_id(caller.identity_id))
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    async fn identity_by_handle(&self, handle: &str) -> Result<Identity, DomainError> {
        let handle = normalize_handle(handle);
        self.deadline
            .run(self.stores.identities.find_by_handle(&handle))
            .await?
            .ok_or_else(|| DomainError::not_found("identity", handle))
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Article, DomainError> {
        self.deadline
            .run(self.stores.articles.find_by_slug(slug))
            .await?
            .ok_or_else(|| DomainError::not_found("article", slug))
    }
}

/// A record that vanished mid-operation is reported as not found.
fn missing_member(err: RepoError, entity_type: &'static str, key: impl ToString) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found(entity_type, key),
        other => other.into(),
    }
}
