//! Route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::session::require_session};

pub mod auth;
pub mod health;
pub mod uploads;

/// Public routes plus the session-gated upload routes.
#[allow(clippy::needless_pass_by_value)]
pub fn app_routes(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(uploads::routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
