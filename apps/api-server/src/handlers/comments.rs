//! Comment endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use conduit_core::DomainError;
use conduit_shared::MessageResponse;
use conduit_shared::dto::{
    CommentEnvelope, CommentResponse, CommentsEnvelope, CreateCommentRequest,
};

use crate::middleware::auth::{CurrentCaller, OptionalViewer};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/articles/{slug}/comments
pub async fn list(
    state: web::Data<AppState>,
    viewer: OptionalViewer,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let comments = state.content.comments(&viewer.0, &path).await?;

    Ok(HttpResponse::Ok().json(CommentsEnvelope {
        comments: comments.into_iter().map(CommentResponse::from).collect(),
    }))
}

/// POST /api/articles/{slug}/comments
pub async fn create(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let view = state
        .content
        .add_comment(&caller.0, &path, body.into_inner().body)
        .await?;

    Ok(HttpResponse::Created().json(CommentEnvelope {
        message: Some("Comment created successfully".to_string()),
        comment: CommentResponse::from(view),
    }))
}

/// DELETE /api/articles/{slug}/comments/{id}
///
/// An id that is not a UUID cannot name a comment, so it is a 404.
pub async fn delete(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (slug, id) = path.into_inner();
    let comment_id =
        Uuid::parse_str(&id).map_err(|_| DomainError::not_found("comment", &id))?;

    state
        .content
        .delete_comment(&caller.0, &slug, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Comment has been successfully deleted!")))
}
