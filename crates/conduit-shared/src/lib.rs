//! # Conduit Shared
//!
//! Wire types of the HTTP API: request bodies, response envelopes and the
//! problem-details error body.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, MessageResponse};
