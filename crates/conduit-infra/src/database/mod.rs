//! Storage backends: PostgreSQL via SeaORM, and an in-memory fallback.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

use std::sync::Arc;

use conduit_core::services::Stores;

pub use connections::DatabaseConfig;
pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use connections::DatabaseConnections;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresArticleRepository, PostgresCommentRepository, PostgresGraphRepository,
    PostgresIdentityRepository,
};

/// Stores backed by a fresh in-memory store.
pub fn memory_stores() -> Stores {
    Stores::from_backend(Arc::new(InMemoryStore::new()))
}

/// Stores backed by PostgreSQL, sharing one pool.
#[cfg(feature = "postgres")]
pub fn postgres_stores(db: sea_orm::DbConn) -> Stores {
    Stores {
        identities: Arc::new(PostgresIdentityRepository::new(db.clone())),
        articles: Arc::new(PostgresArticleRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        graph: Arc::new(PostgresGraphRepository::new(db)),
    }
}
