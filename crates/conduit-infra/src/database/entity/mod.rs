//! SeaORM entities for the Conduit schema.

pub mod article;
pub mod comment;
pub mod favorite;
pub mod follow;
pub mod user;
