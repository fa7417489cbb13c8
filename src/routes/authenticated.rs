use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes that require a resolved session. The router above wraps this
/// module in `auth_middleware`, so anonymous requests get 401 before the
/// handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/user
        // The account behind the current session.
        .route("/api/user", get(handlers::current_user))
}
