//! Application services - the business operations behind every endpoint.
//!
//! Services talk to storage only through the ports in [`crate::ports`] and
//! bound every storage call with a [`Deadline`].

mod account;
mod content;
mod graph;
mod projection;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use account::{AccountService, IdentityChanges, Registration};
pub use content::{ArticleChanges, ArticleQuery, ContentService, NewArticle};
pub use graph::{
    FavoriteOutcome, FollowOutcome, MembershipChange, ReconcileReport, Reconciliation,
    SocialGraph,
};

use crate::error::RepoError;
use crate::ports::{ArticleRepository, CommentRepository, GraphRepository, IdentityRepository};

/// The set of stores a service operates on.
#[derive(Clone)]
pub struct Stores {
    pub identities: Arc<dyn IdentityRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub graph: Arc<dyn GraphRepository>,
}

impl Stores {
    /// Use one backend for every store.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: IdentityRepository + ArticleRepository + CommentRepository + GraphRepository + 'static,
    {
        Self {
            identities: backend.clone(),
            articles: backend.clone(),
            comments: backend.clone(),
            graph: backend,
        }
    }
}

/// Upper bound applied to each storage call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Duration);

impl Deadline {
    pub const DEFAULT: Deadline = Deadline(Duration::from_secs(5));

    pub fn new(limit: Duration) -> Self {
        Self(limit)
    }

    pub fn limit(&self) -> Duration {
        self.0
    }

    /// Await `fut`, turning an expired deadline into `RepoError::Timeout`.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, RepoError>
    where
        F: Future<Output = Result<T, RepoError>>,
    {
        match tokio::time::timeout(self.0, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(limit_ms = self.0.as_millis() as u64, "Storage call timed out");
                Err(RepoError::Timeout)
            }
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_passes_through_fast_calls() {
        let deadline = Deadline::new(Duration::from_millis(200));
        let value = deadline.run(async { Ok::<_, RepoError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn deadline_turns_slow_calls_into_timeouts() {
        let deadline = Deadline::new(Duration::from_millis(10));
        let result = deadline
            .run(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, RepoError>(())
            })
            .await;
        assert!(matches!(result, Err(RepoError::Timeout)));
    }
}
