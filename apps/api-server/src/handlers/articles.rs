//! Article endpoints.

use actix_web::{HttpResponse, web};

use conduit_core::domain::Page;
use conduit_core::services::{ArticleChanges, ArticleQuery, MembershipChange, NewArticle};
use conduit_shared::MessageResponse;
use conduit_shared::dto::{
    ArticleEnvelope, ArticleResponse, ArticlesEnvelope, CreateArticleRequest, ListArticlesQuery,
    PageQuery, UpdateArticleRequest,
};

use crate::middleware::auth::{CurrentCaller, OptionalViewer};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn envelope(message: Option<&str>, article: impl Into<ArticleResponse>) -> ArticleEnvelope {
    ArticleEnvelope {
        message: message.map(String::from),
        article: article.into(),
    }
}

/// GET /api/articles?tag=&author=&favorited=&limit=&offset=
pub async fn list(
    state: web::Data<AppState>,
    viewer: OptionalViewer,
    query: web::Query<ListArticlesQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let listing = state
        .content
        .list_articles(
            &viewer.0,
            ArticleQuery {
                tag: query.tag,
                author: query.author,
                favorited: query.favorited,
                page: Page::new(query.limit, query.offset),
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ArticlesEnvelope::from(listing)))
}

/// GET /api/articles/feed
pub async fn feed(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = Page::new(query.limit, query.offset);
    let listing = state.content.feed(&caller.0, page).await?;

    Ok(HttpResponse::Ok().json(ArticlesEnvelope::from(listing)))
}

/// POST /api/articles
pub async fn create(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    body: web::Json<CreateArticleRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let view = state
        .content
        .create_article(
            &caller.0,
            NewArticle {
                title: body.title,
                description: body.description,
                body: body.body,
                tag_list: body.tag_list,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(envelope(Some("Article created successfully"), view)))
}

/// GET /api/articles/{slug}
pub async fn get(
    state: web::Data<AppState>,
    viewer: OptionalViewer,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.content.article(&viewer.0, &path).await?;
    Ok(HttpResponse::Ok().json(envelope(None, view)))
}

/// PUT /api/articles/{slug}
pub async fn update(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    path: web::Path<String>,
    body: web::Json<UpdateArticleRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let view = state
        .content
        .update_article(
            &caller.0,
            &path,
            ArticleChanges {
                title: body.title,
                description: body.description,
                body: body.body,
                tag_list: body.tag_list,
                reslug: body.reslug,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(envelope(Some("Article updated successfully"), view)))
}

/// DELETE /api/articles/{slug}
pub async fn delete(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.content.delete_article(&caller.0, &path).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Article deleted successfully")))
}

/// POST /api/articles/{slug}/favorite
///
/// Favorites when not yet favorited, unfavorites otherwise.
pub async fn toggle_favorite(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.graph.toggle_favorite(&caller.0, &path).await?;

    let message = match outcome.change {
        MembershipChange::Added => "Article favorited",
        MembershipChange::Removed => "Article unfavorited",
    };
    Ok(HttpResponse::Ok().json(envelope(Some(message), outcome.article)))
}
