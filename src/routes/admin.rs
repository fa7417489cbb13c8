use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Catalog and blog mutations. These share paths with the public reads and
/// are merged into the same method routers, so no auth layer is attached
/// here: every handler takes the `AdminUser` extractor, which answers 403
/// for anonymous and non-admin callers before the body is parsed.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/products
        .route("/api/products", post(handlers::create_product))
        // PUT/DELETE /api/products/{id}
        .route(
            "/api/products/{id}",
            put(handlers::update_product).delete(handlers::delete_product),
        )
        // POST /api/blog
        .route("/api/blog", post(handlers::create_blog_post))
        // PUT/DELETE /api/blog/{id}
        .route(
            "/api/blog/{id}",
            put(handlers::update_blog_post).delete(handlers::delete_blog_post),
        )
}
