//! Route registration and the public/protected split.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod health;
pub mod periods;
pub mod releases;

/// Assembles all routes. Everything except the health probe sits behind
/// the authentication middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(periods::routes())
        .merge(releases::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(protected)
}
