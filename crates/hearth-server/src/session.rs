//! Session token verification.
//!
//! The identity provider's frontend SDK stores a short-lived session JWT in
//! the `__session` cookie; API clients send the same token as
//! `Authorization: Bearer <jwt>`. The token is verified locally against the
//! provider's public key (RS256) or a shared secret (HS256) and its `sub`
//! claim becomes the current user id.
//!
//! A missing, malformed, or expired token is not an error at the HTTP layer:
//! the request is simply anonymous.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::SessionKey;

/// Name of the session cookie set by the identity provider.
pub const SESSION_COOKIE: &str = "__session";

/// Errors from session verification.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The configured key could not be parsed.
    #[error("invalid session key: {0}")]
    InvalidKey(String),

    /// The token failed signature, format, or time checks.
    #[error("invalid session token: {0}")]
    InvalidToken(String),
}

/// Claims read from a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider user id.
    pub sub: String,
    /// Provider session id.
    #[serde(default)]
    pub sid: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// The signed-in user of a request, inserted into request extensions by
/// the gate middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub session_id: Option<String>,
}

/// Verifies session tokens with a fixed key.
#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    /// Build a verifier for the configured key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidKey`] if a PEM key does not parse.
    pub fn new(key: &SessionKey) -> Result<Self, SessionError> {
        let (key, algorithm) = match key {
            SessionKey::RsaPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| SessionError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
            SessionKey::Secret(secret) => {
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_nbf = true;
        validation.leeway = 5;

        Ok(Self { key, validation })
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidToken`] on a bad signature, an
    /// unexpected algorithm, or an expired or not-yet-valid token.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))
    }

    /// Resolve the signed-in user from request headers.
    ///
    /// Returns `None` when no token is present or the token is invalid.
    pub fn session_user(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let token = session_token(headers)?;
        match self.verify(token) {
            Ok(claims) => Some(SessionUser {
                user_id: claims.sub,
                session_id: claims.sid,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid session token");
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

/// Extract the raw session token: bearer header first, then cookie.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}
