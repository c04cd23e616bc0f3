//! Entitlement resolution.
//!
//! An identity is *entitled* when it has paid or trial access, either
//! personally or through an organization it belongs to. The verdict is
//! recomputed on every call and never stored.
//!
//! Resolution order (first match wins):
//!
//! 1. The development bypass switch in [`EntitlementConfig`].
//! 2. The user's public, then private, metadata.
//! 3. The public metadata of each organization the user belongs to. A failed
//!    membership lookup counts as "no organization entitlement".

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::identity::Identity;
use crate::metadata::{self, Metadata};
use crate::provider::{IdentityProvider, MembershipLookup};

/// Statuses that grant access when found in `subscriptionStatus`.
pub const ENTITLED_STATUSES: [&str; 2] = ["active", "trialing"];

/// Resolver configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementConfig {
    /// Treat every identity as entitled. Local development only.
    pub bypass: bool,
    /// `role` values that grant access on their own.
    pub entitled_roles: Vec<String>,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            bypass: false,
            entitled_roles: vec!["agent".to_owned()],
        }
    }
}

/// Where a verdict came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntitlementSource {
    /// The bypass switch is on.
    Bypass,
    /// A signal in the user's own metadata.
    UserMetadata,
    /// A signal in this organization's metadata.
    Organization { id: String },
    /// No signal anywhere.
    None,
}

/// The result of resolving one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementVerdict {
    pub entitled: bool,
    pub source: EntitlementSource,
}

impl EntitlementVerdict {
    fn granted(source: EntitlementSource) -> Self {
        Self {
            entitled: true,
            source,
        }
    }

    fn denied() -> Self {
        Self {
            entitled: false,
            source: EntitlementSource::None,
        }
    }
}

/// Subscription signals shared by users and organizations.
fn has_subscription_signal(meta: &Metadata) -> bool {
    ENTITLED_STATUSES
        .iter()
        .any(|status| meta.str_eq(metadata::SUBSCRIPTION_STATUS, status))
        || meta.is_present(metadata::STRIPE_SUBSCRIPTION_ID)
        || meta.is_present(metadata::SUBSCRIPTION_ID)
        || meta.is_present(metadata::PLAN)
}

/// Resolves identities to entitlement verdicts.
pub struct EntitlementResolver {
    provider: Arc<dyn IdentityProvider>,
    config: EntitlementConfig,
}

impl EntitlementResolver {
    /// Create a resolver reading organizations from `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, config: EntitlementConfig) -> Self {
        Self { provider, config }
    }

    /// The configuration this resolver was built with.
    #[must_use]
    pub fn config(&self) -> &EntitlementConfig {
        &self.config
    }

    /// Whether `identity` currently has paid or trial access.
    pub async fn is_entitled(&self, identity: &Identity) -> bool {
        self.resolve(identity).await.entitled
    }

    /// Resolve `identity` and report which signal decided the verdict.
    pub async fn resolve(&self, identity: &Identity) -> EntitlementVerdict {
        if self.config.bypass {
            debug!(user_id = %identity.id, "entitlement bypass enabled");
            return EntitlementVerdict::granted(EntitlementSource::Bypass);
        }

        if self.user_signal(&identity.public_metadata)
            || self.user_signal(&identity.private_metadata)
        {
            return EntitlementVerdict::granted(EntitlementSource::UserMetadata);
        }

        let lookup = self.provider.lookup_memberships(&identity.id).await;
        if let MembershipLookup::Failed(reason) = &lookup {
            debug!(user_id = %identity.id, %reason, "no organization entitlement: lookup failed");
        }

        lookup
            .memberships()
            .iter()
            .find(|m| has_subscription_signal(&m.organization.public_metadata))
            .map_or_else(EntitlementVerdict::denied, |m| {
                EntitlementVerdict::granted(EntitlementSource::Organization {
                    id: m.organization.id.clone(),
                })
            })
    }

    fn user_signal(&self, meta: &Metadata) -> bool {
        has_subscription_signal(meta)
            || self
                .config
                .entitled_roles
                .iter()
                .any(|role| meta.str_eq(metadata::ROLE, role))
    }
}

impl std::fmt::Debug for EntitlementResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
