//! Tag listing.

use actix_web::{HttpResponse, web};

use conduit_shared::dto::TagsEnvelope;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/tags
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tags = state.content.tags().await?;
    Ok(HttpResponse::Ok().json(TagsEnvelope { tags }))
}
