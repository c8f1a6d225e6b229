//! # Conduit Core
//!
//! The domain layer of the Conduit publishing backend.
//! This crate holds the business rules (sessions, the social graph, content
//! ownership, slug allocation) and the ports infrastructure must implement.
//! It has no storage or transport dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldError, RepoError};
