//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use conduit_infra::{CredentialConfig, DatabaseConfig};

#[cfg(feature = "scheduler")]
use crate::background::SchedulerConfig;
use crate::telemetry::TelemetryConfig;

const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-me";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-me";

/// Login throttling: at most `max_attempts` per client IP per `window`.
#[derive(Debug, Clone)]
pub struct LoginLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Production mode: cross-site `Secure` cookies, strict secret checks.
    pub production: bool,
    pub database: Option<DatabaseConfig>,
    pub credentials: CredentialConfig,
    /// Upper bound for each storage call.
    pub storage_timeout: Duration,
    pub login_limit: LoginLimitConfig,
    #[cfg(feature = "scheduler")]
    pub scheduler: SchedulerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Local defaults: in-memory store, development secrets.
    pub fn development() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            production: false,
            database: None,
            credentials: CredentialConfig::new(DEV_ACCESS_SECRET, DEV_REFRESH_SECRET),
            storage_timeout: Duration::from_secs(5),
            login_limit: LoginLimitConfig {
                max_attempts: 10,
                window: Duration::from_secs(60),
            },
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::development();

        let production = env::var("RUST_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let database = env::var("DATABASE_URL").ok().map(|url| {
            let base = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parse_var("DB_MAX_CONNECTIONS", base.max_connections),
                min_connections: parse_var("DB_MIN_CONNECTIONS", base.min_connections),
                ..base
            }
        });

        let mut credentials = CredentialConfig::new(
            env::var("JWT_SECRET").unwrap_or_else(|_| DEV_ACCESS_SECRET.to_string()),
            env::var("REFRESH_TOKEN_SECRET").unwrap_or_else(|_| DEV_REFRESH_SECRET.to_string()),
        );
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            credentials.issuer = issuer;
        }

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port),
            production,
            database,
            credentials,
            storage_timeout: Duration::from_millis(parse_var(
                "STORAGE_TIMEOUT_MS",
                defaults.storage_timeout.as_millis() as u64,
            )),
            login_limit: LoginLimitConfig {
                max_attempts: parse_var("LOGIN_RATE_LIMIT_MAX", defaults.login_limit.max_attempts),
                window: Duration::from_secs(parse_var(
                    "LOGIN_RATE_LIMIT_WINDOW_SECS",
                    defaults.login_limit.window.as_secs(),
                )),
            },
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        }
    }

    /// Whether either signing secret is still the built-in development value.
    pub fn uses_default_secrets(&self) -> bool {
        self.credentials.access_secret == DEV_ACCESS_SECRET
            || self.credentials.refresh_secret == DEV_REFRESH_SECRET
    }

    /// Log loudly when running with development secrets.
    pub fn warn_on_default_secrets(&self) {
        if !self.uses_default_secrets() {
            return;
        }
        if self.production {
            tracing::error!(
                "JWT_SECRET / REFRESH_TOKEN_SECRET not set in production; tokens are forgeable"
            );
        } else {
            tracing::warn!("Using development signing secrets");
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::development();

        assert!(!config.production);
        assert!(config.database.is_none());
        assert!(config.uses_default_secrets());
        assert_ne!(
            config.credentials.access_secret,
            config.credentials.refresh_secret
        );
        assert_eq!(config.credentials.access_ttl.num_minutes(), 15);
        assert_eq!(config.credentials.refresh_ttl.num_days(), 7);
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        assert_eq!(parse_var("CONDUIT_TEST_UNSET_VARIABLE", 42u16), 42);
    }
}
