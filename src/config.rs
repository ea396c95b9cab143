use std::{env, time::Duration};

/// Fallback session secret used outside production. Tokens signed with it are
/// only ever accepted by a local instance.
const LOCAL_SESSION_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the dashboard's entire configuration state. Loaded once at startup and
/// shared read-only through the application state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and secret requirements.
    pub env: Env,
    // Secret shared with the identity provider; session JWTs are HS256-signed with it.
    pub session_secret: String,
    // Public origin of this service. Callback URLs are built against it.
    pub public_url: String,
    // Base URL of the remote posts/users API.
    pub api_base_url: String,
    // Path prefixes that require a valid session (e.g. "/profile").
    pub protected_prefixes: Vec<String>,
    // Where unauthenticated visitors of a protected path are sent.
    pub sign_in_path: String,
    // Optional per-request timeout for outbound fetches.
    pub fetch_timeout: Option<Duration>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context, used to switch between developer-friendly
/// defaults and hardened production requirements.
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
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            public_url: "http://localhost:3000".to_string(),
            api_base_url: "https://jsonplaceholder.typicode.com".to_string(),
            protected_prefixes: vec!["/profile".to_string()],
            sign_in_path: "/auth/signin".to_string(),
            fetch_timeout: None,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables, falling back to the
    /// defaults above where a value is optional.
    ///
    /// # Panics
    /// Panics in production when `NEXTAUTH_SECRET` is missing, and in any
    /// environment when `FETCH_TIMEOUT_SECS` is set but not a number.
    pub fn load() -> Self {
        let defaults = Self::default();

        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_secret = match env {
            Env::Production => env::var("NEXTAUTH_SECRET")
                .expect("FATAL: NEXTAUTH_SECRET must be set in production."),
            Env::Local => {
                env::var("NEXTAUTH_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string())
            }
        };

        let protected_prefixes = env::var("PROTECTED_PREFIXES")
            .ok()
            .map(|raw| parse_prefixes(&raw))
            .filter(|prefixes| !prefixes.is_empty())
            .unwrap_or(defaults.protected_prefixes);

        let fetch_timeout = env::var("FETCH_TIMEOUT_SECS").ok().map(|raw| {
            let secs = raw
                .trim()
                .parse::<u64>()
                .expect("FATAL: FETCH_TIMEOUT_SECS must be a whole number of seconds.");
            Duration::from_secs(secs)
        });

        Self {
            env,
            session_secret,
            public_url: env::var("NEXTAUTH_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_url),
            api_base_url: env::var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            protected_prefixes,
            sign_in_path: env::var("SIGN_IN_PATH").unwrap_or(defaults.sign_in_path),
            fetch_timeout,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    /// Builds the outbound HTTP client shared by every fetch controller.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.fetch_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Splits a comma-separated prefix list, normalising each entry to a leading
/// slash and no trailing slash.
fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| format!("/{}", prefix.trim_matches('/')))
        .collect()
}
