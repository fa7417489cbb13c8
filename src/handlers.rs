use crate::{
    AppState,
    auth::{self, AdminUser, AuthUser},
    error::AppError,
    models::{
        AuthResponse, BlogPost, InsertBlogPost, InsertProduct, LoginRequest, NewUser, Product,
        RegisterUserRequest, UpdateBlogPost, UpdateProduct, User, Validate,
    },
};
use axum::{
    Json,
    extract::{FromRequest, Path, State},
    http::StatusCode,
};
use chrono::Utc;

const PRODUCT_NOT_FOUND: &str = "Product not found";
const BLOG_POST_NOT_FOUND: &str = "Blog post not found";

/// AppJson
///
/// `Json` extractor whose rejection is an `AppError`, so a malformed or
/// incomplete body becomes a plain-text 400 like every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

// --- Products ---

/// get_products
///
/// [Public Route] Lists every product in id order. No pagination and no
/// server-side filtering; the storefront filters client-side.
#[utoipa::path(
    get,
    path = "/api/products",
    responses((status = 200, description = "All products", body = [Product]))
)]
pub async fn get_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.repo.get_products().await?))
}

/// get_product
///
/// [Public Route] Retrieves a single product.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Found", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, AppError> {
    state
        .repo
        .get_product(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(PRODUCT_NOT_FOUND))
}

/// create_product
///
/// [Admin Route] Validates the body against the insert schema and stores
/// the product. The admin gate is the `AdminUser` extractor.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = InsertProduct,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Invalid body"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_product(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<InsertProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload.validate()?;
    let product = state.repo.create_product(payload).await?;
    tracing::info!(product_id = product.id, admin_id = admin.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// update_product
///
/// [Admin Route] Merges a validated partial update into an existing product.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 400, description = "Invalid body"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_product(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProduct>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;
    let product = state
        .repo
        .update_product(id, payload)
        .await?
        .ok_or(AppError::NotFound(PRODUCT_NOT_FOUND))?;
    tracing::info!(product_id = id, admin_id = admin.id, "product updated");
    Ok(Json(product))
}

/// delete_product
///
/// [Admin Route] Deletes a product. Idempotent: a missing id is still 200.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted or already absent"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn delete_product(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let removed = state.repo.delete_product(id).await?;
    tracing::info!(product_id = id, admin_id = admin.id, removed, "product delete");
    Ok(StatusCode::OK)
}

// --- Blog posts ---

/// get_blog_posts
///
/// [Public Route] Lists every blog post in id order.
#[utoipa::path(
    get,
    path = "/api/blog",
    responses((status = 200, description = "All blog posts", body = [BlogPost]))
)]
pub async fn get_blog_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    Ok(Json(state.repo.get_blog_posts().await?))
}

/// get_blog_post
///
/// [Public Route] Retrieves a single blog post.
#[utoipa::path(
    get,
    path = "/api/blog/{id}",
    params(("id" = i32, Path, description = "Blog post ID")),
    responses(
        (status = 200, description = "Found", body = BlogPost),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlogPost>, AppError> {
    state
        .repo
        .get_blog_post(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(BLOG_POST_NOT_FOUND))
}

/// create_blog_post
///
/// [Admin Route] Stores a new post. A missing `authorId` defaults to the
/// requesting admin and a missing `createdAt` to the current UTC time.
#[utoipa::path(
    post,
    path = "/api/blog",
    request_body = InsertBlogPost,
    responses(
        (status = 201, description = "Created", body = BlogPost),
        (status = 400, description = "Invalid body"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_blog_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<InsertBlogPost>,
) -> Result<(StatusCode, Json<BlogPost>), AppError> {
    payload.validate()?;
    let post = state
        .repo
        .create_blog_post(payload.into_new(admin.id, Utc::now()))
        .await?;
    tracing::info!(post_id = post.id, admin_id = admin.id, "blog post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_blog_post
///
/// [Admin Route] Merges a validated partial update into an existing post.
/// `authorId` and `createdAt` are kept unless the body sets them.
#[utoipa::path(
    put,
    path = "/api/blog/{id}",
    params(("id" = i32, Path, description = "Blog post ID")),
    request_body = UpdateBlogPost,
    responses(
        (status = 200, description = "Updated", body = BlogPost),
        (status = 400, description = "Invalid body"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_blog_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBlogPost>,
) -> Result<Json<BlogPost>, AppError> {
    payload.validate()?;
    let post = state
        .repo
        .update_blog_post(id, payload)
        .await?
        .ok_or(AppError::NotFound(BLOG_POST_NOT_FOUND))?;
    tracing::info!(post_id = id, admin_id = admin.id, "blog post updated");
    Ok(Json(post))
}

/// delete_blog_post
///
/// [Admin Route] Deletes a blog post. Idempotent like `delete_product`.
#[utoipa::path(
    delete,
    path = "/api/blog/{id}",
    params(("id" = i32, Path, description = "Blog post ID")),
    responses(
        (status = 200, description = "Deleted or already absent"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn delete_blog_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let removed = state.repo.delete_blog_post(id).await?;
    tracing::info!(post_id = id, admin_id = admin.id, removed, "blog post delete");
    Ok(StatusCode::OK)
}

// --- Auth ---

/// register_user
///
/// [Public Route] Creates a regular account and opens a session for it.
///
/// The payload type has no admin field, and `NewUser::from_registration`
/// pins `is_admin` to false, so this path can never mint an admin.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid body or username taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;
    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(NewUser::from_registration(payload, password_hash))
        .await?;
    let token = auth::open_session(&state.repo, &state.config, user.id).await?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// login
///
/// [Public Route] Verifies credentials and opens a new session. Unknown
/// usernames and wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    auth::verify_password(&payload.password, &user.password)?;
    let token = auth::open_session(&state.repo, &state.config, user.id).await?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse { user, token }))
}

/// logout
///
/// [Public Route] Revokes the caller's session, if any. Always 200.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(
    State(state): State<AppState>,
    principal: Option<AuthUser>,
) -> Result<StatusCode, AppError> {
    if let Some(session_id) = principal.as_ref().and_then(|p| p.session_id) {
        state.repo.delete_session(session_id).await?;
        tracing::info!(%session_id, "session revoked");
    }
    Ok(StatusCode::OK)
}

/// current_user
///
/// [Authenticated Route] Returns the account behind the current session.
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn current_user(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    // The session resolved a moment ago; a miss means the account was removed since.
    state
        .repo
        .get_user(id)
        .await?
        .map(Json)
        .ok_or(AppError::Unauthorized)
}
