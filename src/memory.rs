use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        BlogPost, InsertProduct, NewBlogPost, NewUser, Product, Session, UpdateBlogPost,
        UpdateProduct, User,
    },
    repository::{RepoResult, Repository, RepositoryError},
};

/// InMemoryRepository
///
/// A `Repository` that keeps every table in process memory behind a single
/// `RwLock`. Used when no `DATABASE_URL` is configured in local mode, and by
/// the test suites.
///
/// Ids are assigned from per-table counters starting at 1 and are never
/// reused, matching `SERIAL` columns.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    sessions: HashMap<Uuid, Session>,
    products: BTreeMap<i32, Product>,
    blog_posts: BTreeMap<i32, BlogPost>,
    next_user_id: i32,
    next_product_id: i32,
    next_blog_post_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::UsernameTaken);
        }

        let id = next_id(&mut tables.next_user_id);
        let created = User {
            id,
            username: user.username,
            password: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            is_business_account: user.is_business_account,
            business_name: user.business_name,
            address: user.address,
            allow_notifications: user.allow_notifications,
            is_admin: user.is_admin,
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn create_session(&self, session: Session) -> RepoResult<()> {
        self.tables
            .write()
            .await
            .sessions
            .insert(session.id, session);
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> RepoResult<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().await.sessions.remove(&id).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn get_products(&self) -> RepoResult<Vec<Product>> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, id: i32) -> RepoResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, req: InsertProduct) -> RepoResult<Product> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_product_id);
        let product = Product {
            id,
            name: req.name,
            description: req.description,
            price: req.price,
            category: req.category,
            image_url: req.image_url,
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i32, req: UpdateProduct) -> RepoResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            req.apply_to(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: i32) -> RepoResult<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn get_blog_posts(&self) -> RepoResult<Vec<BlogPost>> {
        Ok(self.tables.read().await.blog_posts.values().cloned().collect())
    }

    async fn get_blog_post(&self, id: i32) -> RepoResult<Option<BlogPost>> {
        Ok(self.tables.read().await.blog_posts.get(&id).cloned())
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> RepoResult<BlogPost> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_blog_post_id);
        let created = BlogPost {
            id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            author_id: post.author_id,
            created_at: post.created_at,
        };
        tables.blog_posts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_blog_post(
        &self,
        id: i32,
        req: UpdateBlogPost,
    ) -> RepoResult<Option<BlogPost>> {
        let mut tables = self.tables.write().await;
        Ok(tables.blog_posts.get_mut(&id).map(|post| {
            req.apply_to(post);
            post.clone()
        }))
    }

    async fn delete_blog_post(&self, id: i32) -> RepoResult<bool> {
        Ok(self.tables.write().await.blog_posts.remove(&id).is_some())
    }
}
