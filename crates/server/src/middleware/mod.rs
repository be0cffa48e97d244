//! Request extractors shared by the API routes.

pub mod auth;

pub use auth::{AuthError, Claims, JwtVerifier, RequireUser};
