//! Identity, organization, and membership records.
//!
//! These are read-only views of records owned by the external identity
//! provider. Field names match the provider's backend API so the records
//! deserialize straight from its responses.

use serde::{Deserialize, Serialize};

use crate::metadata::{self, Metadata};

/// An authenticated end-user principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider user id (e.g. `user_2abc...`).
    pub id: String,
    /// Metadata readable by the client.
    #[serde(default)]
    pub public_metadata: Metadata,
    /// Metadata visible to the backend only.
    #[serde(default)]
    pub private_metadata: Metadata,
}

impl Identity {
    /// Create an identity with empty metadata.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Replace the public metadata.
    #[must_use]
    pub fn with_public(mut self, public_metadata: Metadata) -> Self {
        self.public_metadata = public_metadata;
        self
    }

    /// Replace the private metadata.
    #[must_use]
    pub fn with_private(mut self, private_metadata: Metadata) -> Self {
        self.private_metadata = private_metadata;
        self
    }

    /// Whether the basic onboarding flow is finished.
    #[must_use]
    pub fn onboarding_complete(&self) -> bool {
        self.public_metadata.is_present(metadata::ONBOARDING_COMPLETE)
    }

    /// Whether the agent-specific onboarding flow is finished.
    #[must_use]
    pub fn agent_onboarding_complete(&self) -> bool {
        self.public_metadata
            .is_present(metadata::AGENT_ONBOARDING_COMPLETE)
    }
}

/// An organization (brokerage, agency).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub public_metadata: Metadata,
}

/// A user's membership in an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Member role inside the organization (e.g. `org:admin`).
    #[serde(default)]
    pub role: String,
    pub organization: Organization,
}

impl Membership {
    /// Membership with the `org:member` role.
    #[must_use]
    pub fn member_of(organization: Organization) -> Self {
        Self {
            role: "org:member".to_owned(),
            organization,
        }
    }
}
