//! Authentication implementations.

mod jwt;
mod password;

pub use jwt::{CredentialConfig, JwtCredentialCodec};
pub use password::Argon2PasswordService;
