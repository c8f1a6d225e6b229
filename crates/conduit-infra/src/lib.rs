//! # Conduit Infrastructure
//!
//! Concrete implementations of the ports defined in `conduit-core`:
//! storage, credential signing, password hashing and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory store only
//! - `postgres` - PostgreSQL storage via SeaORM
//! - `rate-limit` - Rate limiting via governor

pub mod auth;
pub mod database;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use auth::{Argon2PasswordService, CredentialConfig, JwtCredentialCodec};
pub use database::{DatabaseConfig, InMemoryStore, memory_stores};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConnections, postgres_stores};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
