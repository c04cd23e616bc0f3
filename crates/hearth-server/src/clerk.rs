//! Clerk Backend API client.
//!
//! Implements [`IdentityProvider`] by calling the Backend API directly via
//! `reqwest`. Every call is authorized with the instance secret key and
//! re-fetches from the API; nothing is cached between requests.

use std::time::Duration;

use hearth_core::error::ProviderError;
use hearth_core::identity::{Identity, Membership};
use hearth_core::provider::IdentityProvider;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ClerkConfig;

/// Page size for membership listing (the API maximum is 500).
const MEMBERSHIP_PAGE_SIZE: usize = 100;

/// Upper bound on membership pages fetched per user.
const MAX_MEMBERSHIP_PAGES: usize = 10;

#[derive(Deserialize)]
struct MembershipPage {
    data: Vec<Membership>,
    #[serde(default)]
    total_count: Option<usize>,
}

/// HTTP client for the identity provider's backend API.
#[derive(Clone)]
pub struct ClerkClient {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl ClerkClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the HTTP client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn new(config: &ClerkConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("hearth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        user_id: &str,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{path}", self.api_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                user_id: user_id.to_owned(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| ProviderError::Decode {
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for ClerkClient {
    async fn get_user(&self, user_id: &str) -> Result<Identity, ProviderError> {
        let path = format!("/users/{}", urlencoding::encode(user_id));
        self.get_json(&path, user_id).await
    }

    async fn organization_memberships(
        &self,
        user_id: &str,
    ) -> Result<Vec<Membership>, ProviderError> {
        let mut memberships = Vec::new();

        for page in 0..MAX_MEMBERSHIP_PAGES {
            let path = format!(
                "/users/{}/organization_memberships?limit={MEMBERSHIP_PAGE_SIZE}&offset={}",
                urlencoding::encode(user_id),
                page * MEMBERSHIP_PAGE_SIZE
            );
            let batch: MembershipPage = self.get_json(&path, user_id).await?;
            let fetched = batch.data.len();
            memberships.extend(batch.data);

            let total = batch.total_count.unwrap_or(memberships.len());
            if fetched < MEMBERSHIP_PAGE_SIZE || memberships.len() >= total {
                break;
            }
        }

        Ok(memberships)
    }
}

impl std::fmt::Debug for ClerkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
