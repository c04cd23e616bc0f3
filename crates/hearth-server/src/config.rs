//! Server configuration for Hearth.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Loading goes through [`ServerConfig::from_vars`] so tests can supply a
//! fixed variable set instead of touching the process environment.

use std::net::SocketAddr;

use hearth_core::entitlement::EntitlementConfig;

/// Deployment posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable, multi-line.
    Pretty,
}

/// Key used to verify session tokens.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionKey {
    /// PEM-encoded RSA public key (RS256), as issued by the identity provider.
    RsaPem(String),
    /// Shared secret (HS256) for local setups.
    Secret(String),
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RsaPem(_) => f.write_str("SessionKey::RsaPem(..)"),
            Self::Secret(_) => f.write_str("SessionKey::Secret([redacted])"),
        }
    }
}

/// Identity provider (Clerk Backend API) settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ClerkConfig {
    /// Backend API base URL, without trailing slash.
    pub api_url: String,
    /// Backend API secret key. Empty when not configured.
    pub secret_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClerkConfig {
    /// Whether a secret key was supplied.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

impl std::fmt::Debug for ClerkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// External base URL, used to rebuild the original request URL.
    pub public_url: String,
    pub environment: Environment,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    pub log_format: LogFormat,
    /// Injected into the entitlement resolver.
    pub entitlement: EntitlementConfig,
    /// Set when the bypass was requested but refused in production.
    pub bypass_refused: bool,
    pub clerk: ClerkConfig,
    /// Session verification key (None means every request is anonymous).
    pub session_key: Option<SessionKey>,
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on, binds to `0.0.0.0`
    /// - `HEARTH_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:3000`)
    /// - `HEARTH_PUBLIC_URL`: external base URL (default: `http://localhost:3000`)
    /// - `HEARTH_ENV`: `development` or `production` (default: `development`)
    /// - `HEARTH_LOG_LEVEL`: log filter (default: `info`)
    /// - `HEARTH_LOG_FORMAT`: `json` or `pretty` (default: `json` in production)
    /// - `HEARTH_ENTITLEMENT_BYPASS`: treat everyone as entitled (ignored in production)
    /// - `HEARTH_ENTITLED_ROLES`: comma-separated `role` markers (default: `agent`)
    /// - `CLERK_SECRET_KEY`: identity provider backend key
    /// - `CLERK_API_URL`: backend API base (default: `https://api.clerk.com/v1`)
    /// - `HEARTH_PROVIDER_TIMEOUT_SECS`: provider request timeout (default: `10`)
    /// - `CLERK_JWT_KEY`: PEM public key for session tokens
    /// - `HEARTH_SESSION_SECRET`: HS256 secret for session tokens (if no PEM key)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        // Priority: HEARTH_BIND_ADDR > PORT > default 127.0.0.1:3000
        let bind_addr = if let Some(addr) = var("HEARTH_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000)))
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(3000);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 3000))
        };

        let public_url = var("HEARTH_PUBLIC_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_owned())
            .trim_end_matches('/')
            .to_owned();

        let environment = match var("HEARTH_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let log_level = var("HEARTH_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let log_format = match var("HEARTH_LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            _ if environment == Environment::Production => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let bypass_requested = var("HEARTH_ENTITLEMENT_BYPASS").is_some_and(|v| is_truthy(&v));
        let bypass_refused = bypass_requested && environment == Environment::Production;

        let entitled_roles = var("HEARTH_ENTITLED_ROLES").map_or_else(
            || EntitlementConfig::default().entitled_roles,
            |v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_owned)
                    .collect()
            },
        );

        let clerk = ClerkConfig {
            api_url: var("CLERK_API_URL")
                .unwrap_or_else(|| "https://api.clerk.com/v1".to_owned())
                .trim_end_matches('/')
                .to_owned(),
            secret_key: var("CLERK_SECRET_KEY").unwrap_or_default(),
            timeout_secs: var("HEARTH_PROVIDER_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        };

        // PEM key wins over the shared secret.
        let session_key = var("CLERK_JWT_KEY")
            .filter(|k| !k.is_empty())
            .map(|pem| SessionKey::RsaPem(pem.replace("\\n", "\n")))
            .or_else(|| {
                var("HEARTH_SESSION_SECRET")
                    .filter(|s| !s.is_empty())
                    .map(SessionKey::Secret)
            });

        Self {
            bind_addr,
            public_url,
            environment,
            log_level,
            log_format,
            entitlement: EntitlementConfig {
                bypass: bypass_requested && !bypass_refused,
                entitled_roles,
            },
            bypass_refused,
            clerk,
            session_key,
        }
    }
}
