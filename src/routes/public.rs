use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session. Reads of the catalog and the blog are
/// public; the auth endpoints are how a session is obtained or dropped.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/products, GET /api/products/{id}
        .route("/api/products", get(handlers::get_products))
        .route("/api/products/{id}", get(handlers::get_product))
        // GET /api/blog, GET /api/blog/{id}
        .route("/api/blog", get(handlers::get_blog_posts))
        .route("/api/blog/{id}", get(handlers::get_blog_post))
        // POST /api/register
        // Creates a non-admin account and returns a session token.
        .route("/api/register", post(handlers::register_user))
        .route("/api/login", post(handlers::login))
        // POST /api/logout
        // Succeeds with or without a session, so it stays outside the auth layer.
        .route("/api/logout", post(handlers::logout))
}
