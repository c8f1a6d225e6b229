//! Credential cookies.
//!
//! The access cookie is sent on every path; the refresh cookie only reaches
//! the refresh endpoint. Clearing uses the same name, path and flags as
//! setting, otherwise browsers keep the old cookie.

use actix_web::HttpResponseBuilder;
use actix_web::cookie::{Cookie, SameSite, time::Duration};

use conduit_core::domain::CredentialPair;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const ACCESS_PATH: &str = "/";
pub const REFRESH_PATH: &str = "/api/user/refresh-token";

/// Cookie attributes for the current deployment.
///
/// Production serves a cross-site frontend, which needs `SameSite=None`
/// and therefore `Secure`.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    production: bool,
}

impl CookiePolicy {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    fn cookie(
        &self,
        name: &'static str,
        value: String,
        path: &'static str,
        max_age: Duration,
    ) -> Cookie<'static> {
        Cookie::build(name, value)
            .path(path)
            .http_only(true)
            .secure(self.production)
            .same_site(if self.production {
                SameSite::None
            } else {
                SameSite::Lax
            })
            .max_age(max_age)
            .finish()
    }

    /// Attach both credential cookies.
    pub fn set(&self, response: &mut HttpResponseBuilder, credentials: &CredentialPair) {
        response.cookie(self.cookie(
            ACCESS_COOKIE,
            credentials.access_token.clone(),
            ACCESS_PATH,
            Duration::seconds(credentials.access_expires_in),
        ));
        response.cookie(self.cookie(
            REFRESH_COOKIE,
            credentials.refresh_token.clone(),
            REFRESH_PATH,
            Duration::seconds(credentials.refresh_expires_in),
        ));
    }

    /// Expire both credential cookies.
    pub fn clear(&self, response: &mut HttpResponseBuilder) {
        response.cookie(self.cookie(
            ACCESS_COOKIE,
            String::new(),
            ACCESS_PATH,
            Duration::ZERO,
        ));
        response.cookie(self.cookie(
            REFRESH_COOKIE,
            String::new(),
            REFRESH_PATH,
            Duration::ZERO,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::HttpResponse;

    fn pair() -> CredentialPair {
        CredentialPair {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_expires_in: 900,
            refresh_expires_in: 604_800,
        }
    }

    #[test]
    fn test_development_cookies_are_lax_and_not_secure() {
        let mut builder = HttpResponse::Ok();
        CookiePolicy::new(false).set(&mut builder, &pair());
        let response = builder.finish();

        let cookies: Vec<_> = response.cookies().collect();
        let access = cookies.iter().find(|c| c.name() == ACCESS_COOKIE).unwrap();
        let refresh = cookies.iter().find(|c| c.name() == REFRESH_COOKIE).unwrap();

        assert_eq!(access.path(), Some("/"));
        assert_eq!(access.max_age(), Some(Duration::seconds(900)));
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_ne!(access.secure(), Some(true));
        assert_eq!(refresh.path(), Some(REFRESH_PATH));
        assert_eq!(refresh.max_age(), Some(Duration::seconds(604_800)));
    }

    #[test]
    fn test_production_cookies_are_cross_site() {
        let mut builder = HttpResponse::Ok();
        CookiePolicy::new(true).set(&mut builder, &pair());
        let response = builder.finish();

        for cookie in response.cookies() {
            assert_eq!(cookie.secure(), Some(true));
            assert_eq!(cookie.same_site(), Some(SameSite::None));
        }
    }

    #[test]
    fn test_clear_matches_set_scope() {
        let mut builder = HttpResponse::Ok();
        CookiePolicy::new(true).clear(&mut builder);
        let response = builder.finish();

        let cookies: Vec<_> = response.cookies().collect();
        assert_eq!(cookies.len(), 2);
        for cookie in cookies {
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.secure(), Some(true));
            let expected = if cookie.name() == ACCESS_COOKIE {
                ACCESS_PATH
            } else {
                REFRESH_PATH
            };
            assert_eq!(cookie.path(), Some(expected));
        }
    }
}
