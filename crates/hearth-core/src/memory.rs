//! In-memory identity provider for testing and local development.
//!
//! Users and memberships live in `BTreeMap`s behind a `RwLock`. Nothing is
//! persisted. Membership lookups can be switched to fail so callers can
//! exercise their fallback paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::error::ProviderError;
use crate::identity::{Identity, Membership};
use crate::provider::IdentityProvider;

#[derive(Debug, Default)]
struct Inner {
    users: RwLock<BTreeMap<String, Identity>>,
    memberships: RwLock<BTreeMap<String, Vec<Membership>>>,
    fail_memberships: AtomicBool,
}

/// An in-memory [`IdentityProvider`].
///
/// Cloning shares the underlying state.
///
/// # Examples
///
/// ```
/// # use hearth_core::identity::Identity;
/// # use hearth_core::memory::MemoryProvider;
/// # use hearth_core::provider::IdentityProvider;
/// # #[tokio::main]
/// # async fn main() {
/// let provider = MemoryProvider::new();
/// provider.put_user(Identity::new("user_1")).await;
/// let user = provider.get_user("user_1").await.unwrap();
/// assert_eq!(user.id, "user_1");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<Inner>,
}

impl MemoryProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn put_user(&self, identity: Identity) {
        let mut users = self.inner.users.write().await;
        users.insert(identity.id.clone(), identity);
    }

    /// Append a membership for a user.
    pub async fn add_membership(&self, user_id: &str, membership: Membership) {
        let mut memberships = self.inner.memberships.write().await;
        memberships
            .entry(user_id.to_owned())
            .or_default()
            .push(membership);
    }

    /// Make every subsequent membership lookup fail (or succeed again).
    pub fn set_membership_failure(&self, fail: bool) {
        self.inner.fail_memberships.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryProvider {
    async fn get_user(&self, user_id: &str) -> Result<Identity, ProviderError> {
        let users = self.inner.users.read().await;
        users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                user_id: user_id.to_owned(),
            })
    }

    async fn organization_memberships(
        &self,
        user_id: &str,
    ) -> Result<Vec<Membership>, ProviderError> {
        if self.inner.fail_memberships.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport {
                reason: "membership lookup disabled".to_owned(),
            });
        }
        let memberships = self.inner.memberships.read().await;
        Ok(memberships.get(user_id).cloned().unwrap_or_default())
    }
}
