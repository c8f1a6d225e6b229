//! Account endpoints: registration, login, logout, current user, refresh.

use actix_web::{HttpRequest, HttpResponse, web};

use conduit_core::domain::Session;
use conduit_core::services::{IdentityChanges, Registration};
use conduit_shared::MessageResponse;
use conduit_shared::dto::{
    LoginRequest, RegisterUserRequest, UpdateUserRequest, UserEnvelope, UserResponse,
};

use crate::middleware::auth::CurrentCaller;
use crate::middleware::error::AppResult;
use crate::session::REFRESH_COOKIE;
use crate::state::AppState;

fn with_session(
    mut response: actix_web::HttpResponseBuilder,
    state: &AppState,
    session: &Session,
    message: &str,
) -> HttpResponse {
    state.cookies.set(&mut response, &session.credentials);
    response.json(UserEnvelope {
        message: Some(message.to_string()),
        user: UserResponse::from(&session.identity),
    })
}

/// POST /api/users
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let session = state
        .accounts
        .register(Registration {
            handle: body.username,
            name: body.name,
            contact: body.email,
            password: body.password,
        })
        .await?;

    Ok(with_session(
        HttpResponse::Created(),
        &state,
        &session,
        "User registered successfully",
    ))
}

/// POST /api/users/login
///
/// Accepts a handle or an email address in `username`.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let session = state.accounts.login(&body.username, &body.password).await?;

    Ok(with_session(
        HttpResponse::Ok(),
        &state,
        &session,
        "Logged in successfully",
    ))
}

/// POST /api/users/logout
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    state.cookies.clear(&mut response);
    response.json(MessageResponse::new("Logged out successfully"))
}

/// GET /api/user
pub async fn current(
    state: web::Data<AppState>,
    caller: CurrentCaller,
) -> AppResult<HttpResponse> {
    let identity = state.accounts.current(&caller.0).await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: None,
        user: UserResponse::from(&identity),
    }))
}

/// PUT /api/user
///
/// Re-issues both cookies, since the access token carries the handle.
pub async fn update(
    state: web::Data<AppState>,
    caller: CurrentCaller,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let session = state
        .accounts
        .update(
            &caller.0,
            IdentityChanges {
                handle: body.username,
                contact: body.email,
                name: body.name,
                bio: body.bio,
                image: body.image,
                password: body.password,
            },
        )
        .await?;

    Ok(with_session(
        HttpResponse::Ok(),
        &state,
        &session,
        "User updated successfully",
    ))
}

/// POST /api/user/refresh-token
///
/// The refresh cookie is scoped to this path, so it is the only place it
/// is ever sent.
pub async fn refresh(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    let token = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());
    let session = state.accounts.refresh(token.as_deref()).await?;

    let mut response = HttpResponse::Ok();
    state.cookies.set(&mut response, &session.credentials);
    Ok(response.json(MessageResponse::new("Token refreshed successfully")))
}
