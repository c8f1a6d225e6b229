//! Viewer-relative projections of identities, articles and comments.

use uuid::Uuid;

use super::{Deadline, Stores};
use crate::domain::{Article, ArticleView, Comment, CommentView, Identity, Profile};
use crate::error::DomainError;

pub(crate) async fn profile(
    stores: &Stores,
    deadline: Deadline,
    viewer: Option<Uuid>,
    identity: &Identity,
) -> Result<Profile, DomainError> {
    let following = match viewer {
        Some(viewer_id) if viewer_id != identity.id => {
            deadline
                .run(stores.graph.is_following(viewer_id, identity.id))
                .await?
        }
        _ => false,
    };
    Ok(identity.profile(following))
}

pub(crate) async fn author_profile(
    stores: &Stores,
    deadline: Deadline,
    viewer: Option<Uuid>,
    author_id: Uuid,
) -> Result<Profile, DomainError> {
    let author = deadline
        .run(stores.identities.find_by_id(author_id))
        .await?
        .ok_or_else(|| DomainError::not_found("identity", author_id))?;
    profile(stores, deadline, viewer, &author).await
}

pub(crate) async fn article_view(
    stores: &Stores,
    deadline: Deadline,
    viewer: Option<Uuid>,
    article: Article,
) -> Result<ArticleView, DomainError> {
    let author = author_profile(stores, deadline, viewer, article.author_id).await?;
    let favorited = match viewer {
        Some(viewer_id) => {
            deadline
                .run(stores.graph.is_favorited(viewer_id, article.id))
                .await?
        }
        None => false,
    };
    Ok(ArticleView {
        article,
        author,
        favorited,
    })
}

pub(crate) async fn comment_view(
    stores: &Stores,
    deadline: Deadline,
    viewer: Option<Uuid>,
    comment: Comment,
) -> Result<CommentView, DomainError> {
    let author = author_profile(stores, deadline, viewer, comment.author_id).await?;
    Ok(CommentView { comment, author })
}
