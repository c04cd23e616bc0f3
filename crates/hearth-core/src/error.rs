//! Error types for `hearth-core`.
//!
//! Provider errors carry the user id or HTTP status needed to diagnose a
//! failed lookup. They never carry provider credentials.

/// Errors from identity provider lookups.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider has no user with this id.
    #[error("user '{user_id}' not found")]
    NotFound { user_id: String },

    /// The provider answered with a non-success status.
    #[error("identity provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("identity provider unreachable: {reason}")]
    Transport { reason: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode identity provider response: {reason}")]
    Decode { reason: String },
}

/// Errors from request gate evaluation.
///
/// A missing identity is never an error; it yields a redirect or a
/// continue decision.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Fetching the full user record failed.
    #[error("identity lookup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors from building a route table.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// A pattern was empty or did not start with `/`.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
