//! Permission flags, principal snapshots, and the permission gate.
//!
//! Permissions form a closed set checked exhaustively at compile time;
//! unknown flags coming from storage are a parse-time error, never a
//! silently dropped value. The gate itself is a pure function over an
//! immutable [`Principal`] snapshot resolved once per request.

pub mod error;
pub mod principal;
pub mod types;

pub use error::PermissionError;
pub use principal::{Actor, Principal};
pub use types::{Permission, PermissionSet};
