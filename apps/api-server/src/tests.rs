//! HTTP-level tests against the in-memory store.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, dev::ServiceResponse, test, web};
use serde_json::{Value, json};

use conduit_infra::{Argon2PasswordService, memory_stores};

use crate::config::AppConfig;
use crate::handlers;
use crate::observability::{REQUEST_ID_HEADER, RequestIdMiddleware};
use crate::session::{ACCESS_COOKIE, ACCESS_PATH, REFRESH_COOKIE, REFRESH_PATH};
use crate::state::{AppState, Storage};

fn test_state(config: &AppConfig) -> AppState {
    let passwords = Arc::new(Argon2PasswordService::with_cost(1024, 1, 1).unwrap());
    AppState::assemble(memory_stores(), Storage::Memory, config, passwords).unwrap()
}

macro_rules! test_app {
    ($state:expr) => {{
        let state: AppState = $state;
        let limiter = state.login_limiter.clone();
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(state))
                .configure(handlers::extractor_config)
                .configure(move |cfg| handlers::configure_routes(cfg, limiter)),
        )
        .await
    }};
}

/// Register `handle` and return its access token.
macro_rules! register {
    ($app:expr, $handle:expr) => {{
        let handle: &str = $handle;
        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({
                "username": handle,
                "name": handle,
                "email": format!("{handle}@example.com"),
                "password": "password123",
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        cookie_value(&resp, ACCESS_COOKIE).unwrap()
    }};
}

fn cookie_value<B>(resp: &ServiceResponse<B>, name: &str) -> Option<String> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

fn cookies<B>(resp: &ServiceResponse<B>) -> Vec<Cookie<'static>> {
    resp.response().cookies().map(|c| c.into_owned()).collect()
}

fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.cookie(Cookie::new(ACCESS_COOKIE, token.to_string()))
}

#[actix_web::test]
async fn test_register_sets_scoped_cookies_and_keeps_tokens_out_of_body() {
    let app = test_app!(test_state(&AppConfig::development()));

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "username": "alice",
            "name": "Alice",
            "email": "alice@example.com",
            "password": "password123",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let jar = cookies(&resp);
    let access = jar.iter().find(|c| c.name() == ACCESS_COOKIE).unwrap();
    let refresh = jar.iter().find(|c| c.name() == REFRESH_COOKIE).unwrap();
    assert_eq!(access.path(), Some(ACCESS_PATH));
    assert_eq!(refresh.path(), Some(REFRESH_PATH));
    assert_eq!(access.http_only(), Some(true));
    assert_ne!(access.value(), refresh.value());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password").is_none());
    assert!(!body.to_string().contains(access.value()));
}

#[actix_web::test]
async fn test_registration_failures() {
    let app = test_app!(test_state(&AppConfig::development()));
    register!(app, "alice");

    let duplicate = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "username": "alice",
            "name": "Other",
            "email": "other@example.com",
            "password": "password123",
        }))
        .to_request();
    let resp = test::call_service(&app, duplicate).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let invalid = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "carol", "password": "short" }))
        .to_request();
    let resp = test::call_service(&app, invalid).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["password"].is_array());
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["name"].is_array());

    let malformed = test::TestRequest::post()
        .uri("/api/users")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, malformed).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app!(test_state(&AppConfig::development()));
    register!(app, "alice");

    let wrong_password = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "username": "alice", "password": "wrong-password" }))
        .to_request();
    let unknown = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "username": "nobody", "password": "wrong-password" }))
        .to_request();

    let first = test::call_service(&app, wrong_password).await;
    let second = test::call_service(&app, unknown).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert!(cookie_value(&first, ACCESS_COOKIE).is_none());

    let first_body = test::read_body(first).await;
    let second_body = test::read_body(second).await;
    assert_eq!(first_body, second_body);
}

#[actix_web::test]
async fn test_login_by_email_alias() {
    let app = test_app!(test_state(&AppConfig::development()));
    register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "alice@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cookie_value(&resp, ACCESS_COOKIE).is_some());
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_login_is_throttled() {
    let mut config = AppConfig::development();
    config.login_limit.max_attempts = 2;
    config.login_limit.window = std::time::Duration::from_secs(60);
    let app = test_app!(test_state(&config));

    let mut statuses = Vec::new();
    let mut retry_after = None;
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({ "username": "nobody", "password": "password123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        statuses.push(resp.status());
        if let Some(value) = resp.headers().get(header::RETRY_AFTER) {
            retry_after = value.to_str().ok().map(String::from);
        }
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
    assert!(retry_after.unwrap().parse::<u64>().unwrap() >= 1);

    // Other endpoints are not throttled.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/tags").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_required_and_optional_auth() {
    let app = test_app!(test_state(&AppConfig::development()));
    let token = register!(app, "alice");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/user").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 401);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/api/user"), &token).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/user")
            .insert_header((header::AUTHORIZATION, format!("Token {token}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // A forged token on an optional route is an anonymous viewer, not an error.
    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/api/profiles/alice"), "forged.token.value")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["profile"]["following"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/articles/feed").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_refresh_rotates_and_logout_clears() {
    let app = test_app!(test_state(&AppConfig::development()));

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "username": "alice",
            "name": "Alice",
            "email": "alice@example.com",
            "password": "password123",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let access = cookie_value(&resp, ACCESS_COOKIE).unwrap();
    let refresh = cookie_value(&resp, REFRESH_COOKIE).unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/user/refresh-token")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // An access token is not a refresh token.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/user/refresh-token")
            .cookie(Cookie::new(REFRESH_COOKIE, access.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/user/refresh-token")
            .cookie(Cookie::new(REFRESH_COOKIE, refresh))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated = cookie_value(&resp, ACCESS_COOKIE).unwrap();
    assert_ne!(rotated, access);

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/users/logout").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    for cookie in cookies(&resp) {
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
    }
}

#[actix_web::test]
async fn test_update_reissues_cookies() {
    let app = test_app!(test_state(&AppConfig::development()));
    let token = register!(app, "alice");

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::put().uri("/api/user"), &token)
            .set_json(json!({ "username": "alice2", "bio": "writes things" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cookie_value(&resp, ACCESS_COOKIE).is_some());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["username"], "alice2");
    assert_eq!(body["user"]["bio"], "writes things");
}

#[actix_web::test]
async fn test_publishing_scenario() {
    let app = test_app!(test_state(&AppConfig::development()));
    register!(app, "alice");
    let bob = register!(app, "bob");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({ "username": "alice", "password": "password123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let alice = cookie_value(&resp, ACCESS_COOKIE).unwrap();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/api/articles"), &alice)
            .set_json(json!({
                "title": "Hello World",
                "description": "First post",
                "body": "Hi there",
                "tagList": ["intro", "rust", "intro"],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let slug = body["article"]["slug"].as_str().unwrap().to_string();
    let suffix = slug.strip_prefix("hello-world-").unwrap();
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(body["article"]["tagList"], json!(["intro", "rust"]));
    assert_eq!(body["article"]["author"]["username"], "alice");

    let favorite = format!("/api/articles/{slug}/favorite");
    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri(&favorite), &bob).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["article"]["favoritesCount"], 1);
    assert_eq!(body["article"]["favorited"], true);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri(&favorite), &bob).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["article"]["favoritesCount"], 0);
    assert_eq!(body["article"]["favorited"], false);

    let article = format!("/api/articles/{slug}");
    let resp = test::call_service(
        &app,
        authed(test::TestRequest::delete().uri(&article), &bob).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::delete().uri(&article), &alice).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&article).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_follow_feed_and_comments() {
    let app = test_app!(test_state(&AppConfig::development()));
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/api/articles"), &alice)
            .set_json(json!({ "title": "Notes", "description": "d", "body": "b", "tagList": ["misc"] }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let slug = body["article"]["slug"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/api/profiles/bob/follow"), &bob).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri("/api/profiles/alice/follow"), &bob).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["profile"]["following"], true);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::get().uri("/api/articles/feed"), &bob).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["articlesCount"], 1);
    assert_eq!(body["articles"][0]["author"]["following"], true);

    let comments = format!("/api/articles/{slug}/comments");
    let resp = test::call_service(
        &app,
        authed(test::TestRequest::post().uri(&comments), &bob)
            .set_json(json!({ "body": "Nice" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        authed(
            test::TestRequest::delete().uri(&format!("{comments}/{comment_id}")),
            &alice,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        authed(test::TestRequest::delete().uri(&format!("{comments}/not-a-uuid")), &bob)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        authed(
            test::TestRequest::delete().uri(&format!("{comments}/{comment_id}")),
            &bob,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&comments).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["comments"], json!([]));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/tags").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["tags"], json!(["misc"]));
}

#[actix_web::test]
async fn test_listing_query_validation() {
    let app = test_app!(test_state(&AppConfig::development()));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/articles?limit=abc")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/articles?author=ghost")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["articlesCount"], 0);
}

#[actix_web::test]
async fn test_request_id_is_echoed() {
    let app = test_app!(test_state(&AppConfig::development()));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/health")
            .insert_header((REQUEST_ID_HEADER, "trace-123"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-123");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    let generated = resp
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["storage"], "memory");
}
