//! Identity provider abstraction.
//!
//! The provider owns users and organizations; Hearth only reads them. The
//! production implementation talks to the hosted provider's backend API,
//! [`MemoryProvider`](crate::memory::MemoryProvider) serves tests.

use tracing::warn;

use crate::error::ProviderError;
use crate::identity::{Identity, Membership};

/// Read access to the external identity provider.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Fetch the full user record, including public and private metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] for an unknown id, or another
    /// variant if the provider cannot be reached or answers garbage.
    async fn get_user(&self, user_id: &str) -> Result<Identity, ProviderError>;

    /// Fetch every organization membership of a user.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the lookup fails.
    async fn organization_memberships(
        &self,
        user_id: &str,
    ) -> Result<Vec<Membership>, ProviderError>;

    /// Fetch memberships, folding failure into [`MembershipLookup::Failed`].
    async fn lookup_memberships(&self, user_id: &str) -> MembershipLookup {
        match self.organization_memberships(user_id).await {
            Ok(memberships) => MembershipLookup::Found(memberships),
            Err(e) => {
                warn!(user_id, error = %e, "organization membership lookup failed");
                MembershipLookup::Failed(e.to_string())
            }
        }
    }
}

/// Outcome of an organization membership fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipLookup {
    /// The provider answered; the list may be empty.
    Found(Vec<Membership>),
    /// The lookup failed. Callers treat this as "no memberships".
    Failed(String),
}

impl MembershipLookup {
    /// The memberships, or an empty slice when the lookup failed.
    #[must_use]
    pub fn memberships(&self) -> &[Membership] {
        match self {
            Self::Found(memberships) => memberships,
            Self::Failed(_) => &[],
        }
    }

    /// Whether the lookup failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
