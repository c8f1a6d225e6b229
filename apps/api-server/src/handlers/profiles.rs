//! Profile endpoints.

use actix_web::{HttpResponse, web};

use conduit_core::services::MembershipChange;
use conduit_shared::dto::{ProfileEnvelope, ProfileResponse};

use crate::middleware::auth::{CurrentCaller, OptionalViewer};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/profiles/{handle}
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalViewer,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let profile = state.graph.profile(&viewer.0, &path).await?;

    Ok(HttpResponse::Ok().json(ProfileEnvelope {
        message: None,
        profile: ProfileResponse::from(profile),
    }))
}

/// POST /api/profiles/{handle}/follow
///
/// Follows when not yet following, unfollows otherwise.
pub async fn toggle_follow(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.graph.toggle_follow(&caller.0, &path).await?;

    let message = match outcome.change {
        MembershipChange::Added => "Followed",
        MembershipChange::Removed => "Unfollowed",
    };
    Ok(HttpResponse::Ok().json(ProfileEnvelope {
        message: Some(message.to_string()),
        profile: ProfileResponse::from(outcome.profile),
    }))
}
