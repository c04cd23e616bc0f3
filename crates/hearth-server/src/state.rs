//! Shared application state for the Hearth server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Nothing in it is mutated after startup.

use axum::http::{HeaderMap, Uri};

use hearth_core::gate::Gate;

use crate::session::{SessionUser, SessionVerifier};

/// Shared application state passed to all HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// The request gate (route table, provider, entitlement resolver).
    pub gate: Gate,
    /// Session verifier (None when no key is configured).
    pub sessions: Option<SessionVerifier>,
    /// External base URL without trailing slash.
    pub public_url: String,
}

impl AppState {
    /// The signed-in user for these headers, if any.
    pub fn session_user(&self, headers: &HeaderMap) -> Option<SessionUser> {
        self.sessions.as_ref()?.session_user(headers)
    }

    /// The URL the client originally requested, as seen from outside.
    #[must_use]
    pub fn original_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!("{}{path_and_query}", self.public_url)
    }
}
