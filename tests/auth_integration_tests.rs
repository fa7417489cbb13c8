use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{Method, Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use meditool_hub::{
    AppError, AppState, InMemoryRepository,
    auth::{self, AdminUser, AuthUser, Claims},
    config::{AdminSeed, AppConfig, Env},
    models::{NewUser, Session, User},
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn create_app_state(env: Env) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(InMemoryRepository::new()), config)
}

fn create_bypass_state(env: Env) -> AppState {
    let config = AppConfig {
        env,
        dev_auth_bypass: true,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(InMemoryRepository::new()), config)
}

fn user_id_header(id: i32) -> Vec<(header::HeaderName, String)> {
    vec![(header::HeaderName::from_static("x-user-id"), id.to_string())]
}

async fn seed_user(repo: &RepositoryState, username: &str, is_admin: bool) -> User {
    repo.create_user(NewUser {
        username: username.to_string(),
        password_hash: auth::hash_password("correct horse").unwrap(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        is_business_account: false,
        business_name: None,
        address: None,
        allow_notifications: true,
        is_admin,
    })
    .await
    .unwrap()
}

/// Helper to get the mutable Parts struct from a generated Request
fn request_parts(headers: &[(header::HeaderName, String)]) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/");
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

fn bearer(token: &str) -> Vec<(header::HeaderName, String)> {
    vec![(header::AUTHORIZATION, format!("Bearer {}", token))]
}

async fn require_user(headers: &[(header::HeaderName, String)], state: &AppState) -> Result<AuthUser, AppError> {
    let mut parts = request_parts(headers);
    <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, state).await
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_session_token() {
    let state = create_app_state(Env::Production);
    let user = seed_user(&state.repo, "alice", false).await;
    let token = auth::open_session(&state.repo, &state.config, user.id)
        .await
        .unwrap();

    let principal = require_user(&bearer(&token), &state).await.unwrap();

    assert_eq!(principal.id, user.id);
    assert_eq!(principal.username, "alice");
    assert!(!principal.is_admin);
    assert!(principal.session_id.is_some());
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = create_app_state(Env::Production);

    let result = require_user(&[], &state).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_signature() {
    let state = create_app_state(Env::Production);
    let user = seed_user(&state.repo, "mallory", false).await;
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        sid: Uuid::new_v4(),
        iat: now.timestamp() as usize,
        exp: (now + TimeDelta::hours(1)).timestamp() as usize,
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    assert!(require_user(&bearer(&forged), &state).await.is_err());
}

#[tokio::test]
async fn test_auth_failure_with_expired_session_row() {
    let state = create_app_state(Env::Production);
    let user = seed_user(&state.repo, "bob", false).await;

    // Token still within `exp`, but the session row has lapsed.
    let now = Utc::now();
    let session_id = Uuid::new_v4();
    state
        .repo
        .create_session(Session {
            id: session_id,
            user_id: user.id,
            expires_at: now - TimeDelta::minutes(5),
        })
        .await
        .unwrap();
    let claims = Claims {
        sub: user.id,
        sid: session_id,
        iat: now.timestamp() as usize,
        exp: (now + TimeDelta::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(require_user(&bearer(&token), &state).await.is_err());
    // Lapsed rows are dropped once seen
    assert!(state.repo.get_session(session_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_session_purges_lapsed_rows() {
    let state = create_app_state(Env::Production);
    let user = seed_user(&state.repo, "erin", false).await;
    let now = Utc::now();

    let lapsed = Session {
        id: Uuid::new_v4(),
        user_id: 999,
        expires_at: now - TimeDelta::hours(1),
    };
    let live = Session {
        id: Uuid::new_v4(),
        user_id: 999,
        expires_at: now + TimeDelta::hours(1),
    };
    state.repo.create_session(lapsed.clone()).await.unwrap();
    state.repo.create_session(live.clone()).await.unwrap();

    auth::open_session(&state.repo, &state.config, user.id)
        .await
        .unwrap();

    assert!(state.repo.get_session(lapsed.id).await.unwrap().is_none());
    assert_eq!(state.repo.get_session(live.id).await.unwrap(), Some(live));
}

#[tokio::test]
async fn test_open_session_rejects_out_of_range_ttl() {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    let config = AppConfig {
        session_ttl_hours: 10_i64.pow(16),
        ..AppConfig::default()
    };

    let result = auth::open_session(&repo, &config, 1).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::SessionTtl(_)));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_revoked_session_no_longer_authenticates() {
    let state = create_app_state(Env::Production);
    let user = seed_user(&state.repo, "carol", false).await;
    let token = auth::open_session(&state.repo, &state.config, user.id)
        .await
        .unwrap();
    let principal = require_user(&bearer(&token), &state).await.unwrap();

    assert!(
        state
            .repo
            .delete_session(principal.session_id.unwrap())
            .await
            .unwrap()
    );

    assert!(require_user(&bearer(&token), &state).await.is_err());
}

#[tokio::test]
async fn test_optional_principal_is_none_without_credentials() {
    let state = create_app_state(Env::Production);
    let mut parts = request_parts(&bearer("not-a-jwt"));

    let principal =
        <AuthUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

    assert!(principal.is_none());
}

#[tokio::test]
async fn test_admin_gate_rejects_anonymous_and_non_admin() {
    let state = create_app_state(Env::Production);
    let user = seed_user(&state.repo, "dave", false).await;
    let token = auth::open_session(&state.repo, &state.config, user.id)
        .await
        .unwrap();

    let mut anonymous = request_parts(&[]);
    let result = AdminUser::from_request_parts(&mut anonymous, &state).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let mut regular = request_parts(&bearer(&token));
    let result = AdminUser::from_request_parts(&mut regular, &state).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn test_admin_gate_accepts_admin() {
    let state = create_app_state(Env::Production);
    let admin = seed_user(&state.repo, "root", true).await;
    let token = auth::open_session(&state.repo, &state.config, admin.id)
        .await
        .unwrap();

    let mut parts = request_parts(&bearer(&token));
    let AdminUser(principal) = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();

    assert_eq!(principal.id, admin.id);
    assert!(principal.is_admin);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let state = create_bypass_state(Env::Local);
    let admin = seed_user(&state.repo, "local-admin", true).await;

    let principal = require_user(&user_id_header(admin.id), &state).await.unwrap();

    assert_eq!(principal.id, admin.id);
    assert!(principal.is_admin);
    assert!(principal.session_id.is_none());
}

#[tokio::test]
async fn test_local_bypass_off_unless_enabled() {
    let state = create_app_state(Env::Local);
    let admin = seed_user(&state.repo, "quiet-admin", true).await;

    let result = require_user(&user_id_header(admin.id), &state).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));

    let mut parts = request_parts(&user_id_header(admin.id));
    let result = AdminUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let state = create_bypass_state(Env::Production);
    let admin = seed_user(&state.repo, "prod-admin", true).await;

    assert!(require_user(&user_id_header(admin.id), &state).await.is_err());
}

#[tokio::test]
async fn test_password_hash_roundtrip() {
    let hash = auth::hash_password("s3cret").unwrap();

    assert_ne!(hash, "s3cret");
    assert!(auth::verify_password("s3cret", &hash).is_ok());
    assert!(matches!(
        auth::verify_password("wrong", &hash),
        Err(AppError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_ensure_admin_creates_once() {
    let state = create_app_state(Env::Local);
    let seed = AdminSeed {
        username: "owner".to_string(),
        password: "owner-pass".to_string(),
    };

    let created = auth::ensure_admin(&state.repo, &seed).await.unwrap();
    let admin = created.expect("first call creates the admin");
    assert!(admin.is_admin);
    assert!(auth::verify_password("owner-pass", &admin.password).is_ok());

    let second = auth::ensure_admin(&state.repo, &seed).await.unwrap();
    assert!(second.is_none());
}
