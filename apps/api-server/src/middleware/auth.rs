//! Authentication extractors.
//!
//! The access token is read from the `access_token` cookie, falling back to
//! an `Authorization: Bearer <token>` (or `Token <token>`) header.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use conduit_core::DomainError;
use conduit_core::domain::{Caller, Viewer};

use super::error::AppError;
use crate::session::ACCESS_COOKIE;
use crate::state::AppState;

/// Required authentication. Rejects with 401 when no valid access token is
/// present.
///
/// ```ignore
/// async fn feed(caller: CurrentCaller) -> AppResult<HttpResponse> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentCaller(pub Caller);

/// Optional authentication. Never rejects: a missing, expired or forged
/// token yields an anonymous viewer.
#[derive(Debug, Clone)]
pub struct OptionalViewer(pub Viewer);

pub(crate) fn access_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(|t| t.trim().to_string())
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Domain(DomainError::Upstream {
            message: "application state missing".to_string(),
            retryable: false,
        })
    })
}

impl FromRequest for CurrentCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = app_state(req).and_then(|state| {
            state
                .accounts
                .authenticate(access_token(req).as_deref())
                .map(CurrentCaller)
                .map_err(AppError::from)
        });
        ready(result)
    }
}

impl FromRequest for OptionalViewer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = app_state(req)
            .map(|state| OptionalViewer(state.accounts.viewer(access_token(req).as_deref())));
        ready(result)
    }
}
