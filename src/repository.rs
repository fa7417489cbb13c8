use crate::models::{
    BlogPost, InsertProduct, NewBlogPost, NewUser, Product, Session, UpdateBlogPost,
    UpdateProduct, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// Failures surfaced by a `Repository` implementation. Everything except
/// `UsernameTaken` is a server fault.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The unique constraint on `users.username` rejected an insert.
    #[error("username already exists")]
    UsernameTaken,
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The storage collaborator. Handlers only ever talk to `Arc<dyn Repository>`,
/// so Postgres and the in-memory store are interchangeable.
///
/// Lists are returned in ascending id order. `update_*` returns `None` when
/// the id does not exist; `delete_*` reports whether a row was removed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    // Fails with `UsernameTaken` on a duplicate username.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Sessions ---
    async fn create_session(&self, session: Session) -> RepoResult<()>;
    async fn get_session(&self, id: Uuid) -> RepoResult<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> RepoResult<bool>;
    // Removes every session with `expires_at <= now`; returns how many.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> RepoResult<u64>;

    // --- Products ---
    async fn get_products(&self) -> RepoResult<Vec<Product>>;
    async fn get_product(&self, id: i32) -> RepoResult<Option<Product>>;
    async fn create_product(&self, req: InsertProduct) -> RepoResult<Product>;
    async fn update_product(&self, id: i32, req: UpdateProduct) -> RepoResult<Option<Product>>;
    async fn delete_product(&self, id: i32) -> RepoResult<bool>;

    // --- Blog posts ---
    async fn get_blog_posts(&self) -> RepoResult<Vec<BlogPost>>;
    async fn get_blog_post(&self, id: i32) -> RepoResult<Option<BlogPost>>;
    async fn create_blog_post(&self, post: NewBlogPost) -> RepoResult<BlogPost>;
    async fn update_blog_post(&self, id: i32, req: UpdateBlogPost)
    -> RepoResult<Option<BlogPost>>;
    async fn delete_blog_post(&self, id: i32) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, username, password, first_name, last_name, is_business_account, \
     business_name, address, allow_notifications, is_admin";
const PRODUCT_COLUMNS: &str = "id, name, description, price, category, image_url";
const BLOG_POST_COLUMNS: &str = "id, title, content, image_url, author_id, created_at";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. The schema lives in `migrations/` and
/// is applied with [`PostgresRepository::migrate`].
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Inserts the account and maps a unique violation on `username` to
    /// `RepositoryError::UsernameTaken`.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, is_business_account,
                               business_name, address, allow_notifications, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.is_business_account)
            .bind(user.business_name)
            .bind(user.address)
            .bind(user.allow_notifications)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepositoryError::UsernameTaken
                }
                other => RepositoryError::Database(other),
            })
    }

    async fn create_session(&self, session: Session) -> RepoResult<()> {
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> RepoResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_products(&self) -> RepoResult<Vec<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let products = sqlx::query_as::<_, Product>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product(&self, id: i32) -> RepoResult<Option<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn create_product(&self, req: InsertProduct) -> RepoResult<Product> {
        let query = format!(
            "INSERT INTO products (name, description, price, category, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(req.name)
            .bind(req.description)
            .bind(req.price)
            .bind(req.category)
            .bind(req.image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    /// update_product
    ///
    /// Partial update: `COALESCE` keeps the stored column wherever the
    /// corresponding field in `req` is `None`.
    async fn update_product(&self, id: i32, req: UpdateProduct) -> RepoResult<Option<Product>> {
        let query = format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                image_url = COALESCE($6, image_url)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(req.name)
            .bind(req.description)
            .bind(req.price)
            .bind(req.category)
            .bind(req.image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_blog_posts(&self) -> RepoResult<Vec<BlogPost>> {
        let query = format!("SELECT {BLOG_POST_COLUMNS} FROM blog_posts ORDER BY id");
        let posts = sqlx::query_as::<_, BlogPost>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn get_blog_post(&self, id: i32) -> RepoResult<Option<BlogPost>> {
        let query = format!("SELECT {BLOG_POST_COLUMNS} FROM blog_posts WHERE id = $1");
        let post = sqlx::query_as::<_, BlogPost>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> RepoResult<BlogPost> {
        let query = format!(
            "INSERT INTO blog_posts (title, content, image_url, author_id, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {BLOG_POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, BlogPost>(&query)
            .bind(post.title)
            .bind(post.content)
            .bind(post.image_url)
            .bind(post.author_id)
            .bind(post.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(post)
    }

    async fn update_blog_post(
        &self,
        id: i32,
        req: UpdateBlogPost,
    ) -> RepoResult<Option<BlogPost>> {
        let query = format!(
            r#"
            UPDATE blog_posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = COALESCE($4, image_url),
                author_id = COALESCE($5, author_id),
                created_at = COALESCE($6, created_at)
            WHERE id = $1
            RETURNING {BLOG_POST_COLUMNS}
            "#
        );
        let post = sqlx::query_as::<_, BlogPost>(&query)
            .bind(id)
            .bind(req.title)
            .bind(req.content)
            .bind(req.image_url)
            .bind(req.author_id)
            .bind(req.created_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn delete_blog_post(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
