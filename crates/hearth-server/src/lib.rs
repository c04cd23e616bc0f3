//! Hearth HTTP server.
//!
//! Puts the request gate from `hearth-core` in front of every route as Axum
//! middleware, backed by the Clerk Backend API for identity lookups and
//! local JWT verification for sessions.

pub mod clerk;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
