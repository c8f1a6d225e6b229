//! HTTP handlers and route configuration.

mod articles;
mod comments;
mod health;
mod profiles;
mod tags;
mod users;

use std::sync::Arc;

use actix_web::{error, web};

use conduit_core::ports::RateLimiter;

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Malformed JSON bodies and query strings become RFC 7807 400s.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }));
}

/// Configure all application routes. `login_limiter` throttles only the
/// login endpoint.
pub fn configure_routes(cfg: &mut web::ServiceConfig, login_limiter: Option<Arc<dyn RateLimiter>>) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/tags", web::get().to(tags::list))
            .service(
                web::scope("/users")
                    .route("", web::post().to(users::register))
                    .service(
                        web::resource("/login")
                            .wrap(RateLimitMiddleware::new(login_limiter))
                            .route(web::post().to(users::login)),
                    )
                    .route("/logout", web::post().to(users::logout)),
            )
            .service(
                web::scope("/user")
                    .route("", web::get().to(users::current))
                    .route("", web::put().to(users::update))
                    .route("/refresh-token", web::post().to(users::refresh)),
            )
            .service(
                web::scope("/profiles")
                    .route("/{handle}", web::get().to(profiles::profile))
                    .route("/{handle}/follow", web::post().to(profiles::toggle_follow)),
            )
            .service(
                web::scope("/articles")
                    .route("", web::get().to(articles::list))
                    .route("", web::post().to(articles::create))
                    // Registered before "/{slug}" so "feed" is never read as a slug.
                    .route("/feed", web::get().to(articles::feed))
                    .route("/{slug}", web::get().to(articles::get))
                    .route("/{slug}", web::put().to(articles::update))
                    .route("/{slug}", web::delete().to(articles::delete))
                    .route("/{slug}/favorite", web::post().to(articles::toggle_favorite))
                    .route("/{slug}/comments", web::get().to(comments::list))
                    .route("/{slug}/comments", web::post().to(comments::create))
                    .route("/{slug}/comments/{id}", web::delete().to(comments::delete)),
            ),
    );
}
