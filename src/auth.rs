use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AdminSeed, AppConfig, Env},
    error::AppError,
    models::{NewUser, Session, User},
    repository::RepositoryState,
};

/// Claims
///
/// Payload of a session token. The token is only a pointer: `sid` must still
/// name a live row in `sessions` for the request to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: i32,
    /// Session id, revoked on logout.
    pub sid: Uuid,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The request-scoped principal. Handlers receive it as an extractor
/// argument instead of reading ambient request state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    /// `None` when resolved through the local `x-user-id` bypass.
    pub session_id: Option<Uuid>,
}

impl AuthUser {
    fn from_user(user: User, session_id: Option<Uuid>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            session_id,
        }
    }
}

/// AdminUser
///
/// Admin gate. Extraction succeeds only for a principal whose `is_admin`
/// flag is set; anonymous and non-admin callers are rejected with 403
/// before the body is read or storage is touched.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// resolve_principal
///
/// Shared resolution behind every auth extractor:
/// 1. Local bypass: in `Env::Local` with `dev_auth_bypass` set, an
///    `x-user-id` header naming a stored user.
/// 2. Bearer token: signature and `exp` checked by `jsonwebtoken`.
/// 3. Session lookup: the `sid` row must exist, be unexpired and belong to
///    `sub`. An expired row is deleted on sight.
/// 4. User lookup: the account must still exist.
///
/// Missing or unusable credentials resolve to `Ok(None)`; only storage
/// failures are errors.
async fn resolve_principal<S>(parts: &Parts, state: &S) -> Result<Option<AuthUser>, AppError>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let repo = RepositoryState::from_ref(state);
    let config = AppConfig::from_ref(state);

    if config.env == Env::Local && config.dev_auth_bypass {
        let bypass_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i32>().ok());
        if let Some(user_id) = bypass_id {
            if let Some(user) = repo.get_user(user_id).await? {
                return Ok(Some(AuthUser::from_user(user, None)));
            }
        }
    }

    let Some(token) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    else {
        return Ok(None);
    };

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let claims = match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = ?e.kind(), "rejected session token");
            return Ok(None);
        }
    };

    let session = match repo.get_session(claims.sid).await? {
        Some(session) if session.is_expired(Utc::now()) => {
            repo.delete_session(session.id).await?;
            tracing::debug!(session_id = %session.id, "expired session removed");
            return Ok(None);
        }
        Some(session) if session.user_id == claims.sub => session,
        _ => return Ok(None),
    };

    let user = repo.get_user(claims.sub).await?;
    Ok(user.map(|user| AuthUser::from_user(user, Some(session.id))))
}

/// Required principal: rejects with 401 when no session resolves.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve_principal(parts, state)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional principal, for routes that behave the same with or without a session.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        resolve_principal(parts, state).await
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve_principal(parts, state).await? {
            Some(user) if user.is_admin => Ok(AdminUser(user)),
            _ => Err(AppError::Forbidden),
        }
    }
}

// --- Sessions ---

/// open_session
///
/// Stores a new session row for `user_id` and returns the signed token
/// naming it. Both expire after `config.session_ttl_hours`. Lapsed rows of
/// every user are purged first.
pub async fn open_session(
    repo: &RepositoryState,
    config: &AppConfig,
    user_id: i32,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = TimeDelta::try_hours(config.session_ttl_hours)
        .filter(|ttl| *ttl > TimeDelta::zero())
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(AppError::SessionTtl(config.session_ttl_hours))?;

    let purged = repo.delete_expired_sessions(now).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions purged");
    }

    let session = Session {
        id: Uuid::new_v4(),
        user_id,
        expires_at,
    };
    repo.create_session(session.clone()).await?;

    let claims = Claims {
        sub: user_id,
        sid: session.id,
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

// --- Passwords ---

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::PasswordHash)
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

/// ensure_admin
///
/// Creates the configured admin account unless the username is already
/// taken. Returns the created user, or `None` when it already existed.
pub async fn ensure_admin(repo: &RepositoryState, seed: &AdminSeed) -> Result<Option<User>, AppError> {
    if repo.get_user_by_username(&seed.username).await?.is_some() {
        tracing::info!(username = %seed.username, "admin account already present");
        return Ok(None);
    }

    let admin = repo
        .create_user(NewUser {
            username: seed.username.clone(),
            password_hash: hash_password(&seed.password)?,
            first_name: "Site".to_string(),
            last_name: "Administrator".to_string(),
            is_business_account: false,
            business_name: None,
            address: None,
            allow_notifications: false,
            is_admin: true,
        })
        .await?;
    tracing::info!(user_id = admin.id, username = %admin.username, "admin account created");
    Ok(Some(admin))
}
