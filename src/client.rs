//! Typed HTTP client for the API, as used by the storefront and admin pages.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::models::{
    AuthResponse, BlogPost, InsertBlogPost, InsertProduct, LoginRequest, Product,
    RegisterUserRequest, UpdateBlogPost, UpdateProduct, User,
};

/// ClientError
///
/// `Status` carries the server's plain-text body, which is what the UI shows
/// in its error notification.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(e) => e.status(),
            Self::Status { status, .. } => Some(*status),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Resource
///
/// An entity exposed as a REST collection under `PATH`, with its insert
/// payload and its partial-update payload.
pub trait Resource: DeserializeOwned + Send + Sync {
    const PATH: &'static str;
    type Insert: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync + From<Self::Insert>;

    fn id(&self) -> i32;
}

impl Resource for Product {
    const PATH: &'static str = "/api/products";
    type Insert = InsertProduct;
    type Update = UpdateProduct;

    fn id(&self) -> i32 {
        self.id
    }
}

impl Resource for BlogPost {
    const PATH: &'static str = "/api/blog";
    type Insert = InsertBlogPost;
    type Update = UpdateBlogPost;

    fn id(&self) -> i32 {
        self.id
    }
}

/// ApiClient
///
/// Holds the base URL and, once logged in, the session token sent as a
/// bearer header on every request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await?;
        Err(ClientError::Status { status, message })
    }

    // --- Auth ---

    /// Registers and keeps the returned session token.
    pub async fn register(&mut self, req: &RegisterUserRequest) -> ClientResult<User> {
        let response = Self::send(self.request(Method::POST, "/api/register").json(req)).await?;
        let AuthResponse { user, token } = response.json().await?;
        self.token = Some(token);
        Ok(user)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<User> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = Self::send(self.request(Method::POST, "/api/login").json(&body)).await?;
        let AuthResponse { user, token } = response.json().await?;
        self.token = Some(token);
        Ok(user)
    }

    /// Revokes the session server-side and forgets the token.
    pub async fn logout(&mut self) -> ClientResult<()> {
        Self::send(self.request(Method::POST, "/api/logout")).await?;
        self.token = None;
        Ok(())
    }

    pub async fn current_user(&self) -> ClientResult<User> {
        let response = Self::send(self.request(Method::GET, "/api/user")).await?;
        Ok(response.json().await?)
    }

    // --- Collections ---

    pub async fn list<R: Resource>(&self) -> ClientResult<Vec<R>> {
        let response = Self::send(self.request(Method::GET, R::PATH)).await?;
        Ok(response.json().await?)
    }

    pub async fn get<R: Resource>(&self, id: i32) -> ClientResult<R> {
        let path = format!("{}/{}", R::PATH, id);
        let response = Self::send(self.request(Method::GET, &path)).await?;
        Ok(response.json().await?)
    }

    pub async fn create<R: Resource>(&self, form: &R::Insert) -> ClientResult<R> {
        let response = Self::send(self.request(Method::POST, R::PATH).json(form)).await?;
        Ok(response.json().await?)
    }

    pub async fn update<R: Resource>(&self, id: i32, patch: &R::Update) -> ClientResult<R> {
        let path = format!("{}/{}", R::PATH, id);
        let response = Self::send(self.request(Method::PUT, &path).json(patch)).await?;
        Ok(response.json().await?)
    }

    pub async fn delete<R: Resource>(&self, id: i32) -> ClientResult<()> {
        let path = format!("{}/{}", R::PATH, id);
        Self::send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}

/// Editor
///
/// Admin form state for one entity type. With a record selected, `submit`
/// sends the form as a PUT to that record; otherwise it POSTs a new one.
/// The selection is cleared after every successful submit. No optimistic
/// update: callers re-list to see the result.
#[derive(Debug)]
pub struct Editor<R: Resource> {
    selected: Option<R>,
}

impl<R: Resource> Default for Editor<R> {
    fn default() -> Self {
        Self { selected: None }
    }
}

impl<R: Resource> Editor<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, record: R) {
        self.selected = Some(record);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&R> {
        self.selected.as_ref()
    }

    pub async fn submit(&mut self, client: &ApiClient, form: R::Insert) -> ClientResult<R> {
        let saved = match self.selected.as_ref().map(Resource::id) {
            Some(id) => client.update::<R>(id, &R::Update::from(form)).await?,
            None => client.create::<R>(&form).await?,
        };
        self.selected = None;
        Ok(saved)
    }
}
