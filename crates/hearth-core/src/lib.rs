//! Core library for Hearth.
//!
//! Hearth decides, for every inbound request to the listings site, whether
//! the request may proceed or must be redirected. Two pieces do the work:
//!
//! - [`entitlement::EntitlementResolver`] answers "does this identity have
//!   paid/active access?" from user and organization metadata.
//! - [`gate::Gate`] classifies the request path through a
//!   [`route::RouteTable`] and applies the onboarding and entitlement
//!   decision table.
//!
//! Identities live in an external provider, reached through the
//! [`provider::IdentityProvider`] trait. [`memory::MemoryProvider`] is an
//! in-memory implementation for tests and local development.

pub mod entitlement;
pub mod error;
pub mod gate;
pub mod identity;
pub mod memory;
pub mod metadata;
pub mod provider;
pub mod route;
