use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table. The password column holds an
/// Argon2 PHC string and is never written to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_business_account: bool,
    // Only meaningful for business accounts; not enforced against the flag.
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub allow_notifications: bool,
    pub is_admin: bool,
}

/// Product
///
/// A catalog entry from the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Price in the minor currency unit (cents).
    pub price: i32,
    pub category: String,
    pub image_url: String,
}

/// BlogPost
///
/// A blog entry from the `blog_posts` table. `author_id` is not checked
/// against `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogPost {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author_id: i32,
    pub created_at: String,
}

/// Session
///
/// Server-side session row. A bearer token is only honoured while its
/// session row exists and has not expired.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// --- Validation ---

/// ValidationError
///
/// A request payload that parsed but broke a field rule. Rendered as a
/// 400 with the message as the body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Field rules applied to request payloads before they reach storage.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError(format!("{field} must not be negative")));
    }
    Ok(())
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /api/register).
/// There is no `is_admin` field: an `isAdmin` key sent by a client is
/// dropped during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_business_account: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default = "default_allow_notifications")]
    pub allow_notifications: bool,
}

fn default_allow_notifications() -> bool {
    true
}

impl Validate for RegisterUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

/// LoginRequest
///
/// Credentials for POST /api/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// AuthResponse
///
/// Returned by register and login: the account plus the bearer token that
/// identifies the new session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// NewUser
///
/// Storage-level insert for `users`. Only the registration handler and the
/// admin bootstrap build one; `is_admin` is fixed by the caller, never by a
/// request body.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_business_account: bool,
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub allow_notifications: bool,
    pub is_admin: bool,
}

impl NewUser {
    /// Builds a regular (non-admin) account from a registration payload.
    pub fn from_registration(req: RegisterUserRequest, password_hash: String) -> Self {
        Self {
            username: req.username,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            is_business_account: req.is_business_account,
            business_name: req.business_name,
            address: req.address,
            allow_notifications: req.allow_notifications,
            is_admin: false,
        }
    }
}

/// InsertProduct
///
/// Creation payload for POST /api/products. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InsertProduct {
    pub name: String,
    pub description: String,
    pub price: i32,
    pub category: String,
    pub image_url: String,
}

impl Validate for InsertProduct {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_negative("price", self.price)
    }
}

/// UpdateProduct
///
/// Partial update payload for PUT /api/products/{id}. Absent fields keep
/// their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Validate for UpdateProduct {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(price) = self.price {
            require_non_negative("price", price)?;
        }
        Ok(())
    }
}

impl UpdateProduct {
    /// Merges the present fields into `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
    }
}

impl From<InsertProduct> for UpdateProduct {
    fn from(form: InsertProduct) -> Self {
        Self {
            name: Some(form.name),
            description: Some(form.description),
            price: Some(form.price),
            category: Some(form.category),
            image_url: Some(form.image_url),
        }
    }
}

/// InsertBlogPost
///
/// Creation payload for POST /api/blog. `author_id` and `created_at` may be
/// omitted; the handler fills them from the requesting admin and the clock.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InsertBlogPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Validate for InsertBlogPost {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)
    }
}

impl InsertBlogPost {
    /// Resolves the optional fields into a complete storage insert.
    pub fn into_new(self, default_author: i32, now: DateTime<Utc>) -> NewBlogPost {
        NewBlogPost {
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            author_id: self.author_id.unwrap_or(default_author),
            created_at: self.created_at.unwrap_or_else(|| now.to_rfc3339()),
        }
    }
}

/// NewBlogPost
///
/// Storage-level insert for `blog_posts` with every column resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author_id: i32,
    pub created_at: String,
}

/// UpdateBlogPost
///
/// Partial update payload for PUT /api/blog/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateBlogPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Validate for UpdateBlogPost {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.title {
            Some(title) => require_non_empty("title", title),
            None => Ok(()),
        }
    }
}

impl UpdateBlogPost {
    pub fn apply_to(self, post: &mut BlogPost) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(image_url) = self.image_url {
            post.image_url = image_url;
        }
        if let Some(author_id) = self.author_id {
            post.author_id = author_id;
        }
        if let Some(created_at) = self.created_at {
            post.created_at = created_at;
        }
    }
}

impl From<InsertBlogPost> for UpdateBlogPost {
    fn from(form: InsertBlogPost) -> Self {
        Self {
            title: Some(form.title),
            content: Some(form.content),
            image_url: Some(form.image_url),
            author_id: form.author_id,
            created_at: form.created_at,
        }
    }
}
