use std::env;

const LOCAL_SESSION_SECRET: &str = "local-development-session-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded
/// and pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Runtime environment marker.
    pub env: Env,
    // Accept the x-user-id development header. Only honoured in `Env::Local`.
    pub dev_auth_bypass: bool,
    // HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    // Lifetime of a session (and of the token that names it).
    pub session_ttl_hours: i64,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Optional admin account created at startup.
    pub admin_seed: Option<AdminSeed>,
}

/// AdminSeed
///
/// Credentials for the admin account provisioned at startup. Registration
/// can never grant the admin flag, so this is how the first admin exists.
#[derive(Clone, Debug, PartialEq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Env
///
/// Defines the runtime context: developer conveniences (in-memory store,
/// header bypass, pretty logs) versus hardened production behaviour.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking configuration used for test setup.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            dev_auth_bypass: false,
            jwt_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            bind_addr: "127.0.0.1:0".to_string(),
            admin_seed: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables at startup.
    ///
    /// `APP_ENV` defaults to `local`. The `x-user-id` bypass additionally
    /// needs `AUTH_DEV_BYPASS=1` and is never enabled in production.
    ///
    /// # Panics
    /// Panics if `APP_ENV` is neither `local` nor `production`, if
    /// `DATABASE_URL` or `SESSION_SECRET` is missing in production, or if
    /// `SESSION_TTL_HOURS` is set but is not an integer in
    /// `1..=MAX_SESSION_TTL_HOURS`.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "local" => Env::Local,
            "production" => Env::Production,
            other => panic!("FATAL: APP_ENV must be 'local' or 'production', got '{}'", other),
        };

        let dev_auth_bypass = env == Env::Local
            && matches!(env::var("AUTH_DEV_BYPASS").as_deref(), Ok("1") | Ok("true"));

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                env::var("SESSION_SECRET")
                    .expect("FATAL: SESSION_SECRET must be set in production."),
            ),
            // Locally the database is optional and the secret has a fallback.
            Env::Local => (
                env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                env::var("SESSION_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
            ),
        };

        let session_ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
                .expect("FATAL: SESSION_TTL_HOURS must be an integer between 1 and 8784"),
            Err(_) => DEFAULT_SESSION_TTL_HOURS,
        };

        let admin_seed = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminSeed { username, password })
            }
            _ => None,
        };

        Self {
            db_url,
            env,
            dev_auth_bypass,
            jwt_secret,
            session_ttl_hours,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            admin_seed,
        }
    }
}
