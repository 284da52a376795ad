//! Shared foundation for the Notara workspace: typed entity ids, the
//! coarse error vocabulary, layered runtime configuration, and JWT
//! handling for user and enterprise principals.

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtService};
