use std::env;

/// Name of the cookie the UI stores its session token in.
pub const DEFAULT_SESSION_COOKIE: &str = "accessToken";

/// AppConfig
///
/// Holds the gateway's entire configuration state. Immutable once loaded and shared
/// with the middleware and handlers through `FromRef`, like every other piece of `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Origin of the UI application that allowed requests are forwarded to.
    pub upstream_url: String,
    // Externally visible origin used to build absolute redirect URLs.
    // When unset, the origin is derived from the request's Host header.
    pub public_origin: Option<String>,
    // Cookie that carries the session token.
    pub session_cookie: String,
    // When true, the role claim is only trusted after HS256 verification with `jwt_secret`.
    pub verify_signature: bool,
    // Shared secret for signature verification. Unused unless `verify_signature` is set.
    pub jwt_secret: Option<String>,
    // Upper bound for request bodies relayed to the upstream. Responses are streamed.
    pub max_body_bytes: usize,
}

/// Env
///
/// Runtime context. Local favors readable logs and permissive defaults,
/// Production demands every infrastructure setting explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests and local scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            upstream_url: "http://localhost:3001".to_string(),
            public_origin: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            verify_signature: false,
            jwt_secret: None,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics when a setting required by the current environment is missing:
    /// `UPSTREAM_URL` in production, and `JWT_SECRET` whenever
    /// `GUARD_VERIFY_SIGNATURE` is enabled.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let defaults = Self::default();

        let upstream_url = match env {
            Env::Production => {
                env::var("UPSTREAM_URL").expect("FATAL: UPSTREAM_URL must be set in production.")
            }
            Env::Local => env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
        };

        let verify_signature = env::var("GUARD_VERIFY_SIGNATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        if verify_signature && jwt_secret.is_none() {
            panic!("FATAL: JWT_SECRET must be set when GUARD_VERIFY_SIGNATURE is enabled.");
        }

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            public_origin: env::var("PUBLIC_ORIGIN")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches('/').to_string()),
            session_cookie: env::var("SESSION_COOKIE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.session_cookie),
            verify_signature,
            jwt_secret,
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        }
    }
}
