//! Request middleware.

pub mod auth;

pub use auth::{AuthPrincipal, auth_middleware};
