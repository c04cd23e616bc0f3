//! The request gate.
//!
//! Every gated request passes through [`Gate::decide`] before reaching a
//! page handler. The gate classifies the path, then applies this table in
//! order:
//!
//! | # | condition                                                  | decision          |
//! |---|------------------------------------------------------------|-------------------|
//! | 1 | public path                                                | continue          |
//! | 2 | anonymous, protected or onboarding path                    | sign-in           |
//! | 3 | anonymous, anything else                                   | continue          |
//! | 4 | protected (not onboarding), `onboardingComplete` absent    | onboarding        |
//! | 5 | onboarding path, `onboardingComplete` present              | home              |
//! | 6 | agent-restricted, not entitled                             | pricing           |
//! | 7 | agent-restricted, `agentOnboardingComplete` absent         | agent onboarding  |
//! | 8 | otherwise                                                  | continue          |
//!
//! Row 7 never fires on the agent-onboarding path itself, so an entitled
//! agent is redirected there at most once.
//!
//! The full user record is fetched only when a row past 3 can apply. A
//! failed fetch is returned as [`GateError`]; the gate never lets a request
//! through because the provider was unavailable.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::entitlement::EntitlementResolver;
use crate::error::GateError;
use crate::provider::IdentityProvider;
use crate::route::{RouteClass, RouteTable};

/// Paths the gate redirects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPaths {
    pub sign_in: String,
    pub onboarding: String,
    pub agent_onboarding: String,
    pub pricing: String,
    pub home: String,
}

impl Default for RedirectPaths {
    fn default() -> Self {
        Self {
            sign_in: "/sign-in".to_owned(),
            onboarding: "/onboarding".to_owned(),
            agent_onboarding: "/agent-onboarding".to_owned(),
            pricing: "/pricing".to_owned(),
            home: "/".to_owned(),
        }
    }
}

/// Where a redirect points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum RedirectTarget {
    /// Sign in, then return to `redirect_url`.
    SignIn { redirect_url: String },
    Onboarding,
    AgentOnboarding,
    Pricing,
    Home,
}

impl RedirectTarget {
    /// The `Location` for this redirect.
    #[must_use]
    pub fn location(&self, paths: &RedirectPaths) -> String {
        match self {
            Self::SignIn { redirect_url } => format!(
                "{}?redirect_url={}",
                paths.sign_in,
                urlencoding::encode(redirect_url)
            ),
            Self::Onboarding => paths.onboarding.clone(),
            Self::AgentOnboarding => paths.agent_onboarding.clone(),
            Self::Pricing => paths.pricing.clone(),
            Self::Home => paths.home.clone(),
        }
    }
}

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Continue,
    Redirect(RedirectTarget),
}

/// What the gate needs to know about a request.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    /// Request path, without query string.
    pub path: &'a str,
    /// The original request URL, carried through sign-in.
    pub url: &'a str,
    /// Signed-in user id, if a valid session was presented.
    pub user_id: Option<&'a str>,
}

/// The request gate. Immutable after construction, shared across requests.
pub struct Gate {
    routes: RouteTable,
    paths: RedirectPaths,
    provider: Arc<dyn IdentityProvider>,
    resolver: EntitlementResolver,
}

impl Gate {
    /// Create a gate.
    #[must_use]
    pub fn new(
        routes: RouteTable,
        paths: RedirectPaths,
        provider: Arc<dyn IdentityProvider>,
        resolver: EntitlementResolver,
    ) -> Self {
        Self {
            routes,
            paths,
            provider,
            resolver,
        }
    }

    /// Redirect paths in use.
    #[must_use]
    pub fn paths(&self) -> &RedirectPaths {
        &self.paths
    }

    /// The entitlement resolver the gate consults.
    #[must_use]
    pub fn resolver(&self) -> &EntitlementResolver {
        &self.resolver
    }

    /// The identity provider the gate reads from.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Classify a path with this gate's route table.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        self.routes.classify(path)
    }

    /// Decide whether a request continues or is redirected.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Provider`] if the full user record cannot be
    /// fetched.
    pub async fn decide(&self, req: GateRequest<'_>) -> Result<GateDecision, GateError> {
        let class = self.routes.classify(req.path);

        if class.public {
            return Ok(GateDecision::Continue);
        }

        let Some(user_id) = req.user_id else {
            if class.protected || class.onboarding {
                return Ok(GateDecision::Redirect(RedirectTarget::SignIn {
                    redirect_url: req.url.to_owned(),
                }));
            }
            return Ok(GateDecision::Continue);
        };

        if !class.is_restricted() {
            return Ok(GateDecision::Continue);
        }

        let user = self.provider.get_user(user_id).await?;
        let onboarded = user.onboarding_complete();

        if class.protected && !class.onboarding && !onboarded {
            debug!(user_id, path = req.path, "onboarding incomplete");
            return Ok(GateDecision::Redirect(RedirectTarget::Onboarding));
        }

        if class.onboarding && onboarded {
            return Ok(GateDecision::Redirect(RedirectTarget::Home));
        }

        if class.agent_restricted {
            if !self.resolver.is_entitled(&user).await {
                debug!(user_id, path = req.path, "not entitled");
                return Ok(GateDecision::Redirect(RedirectTarget::Pricing));
            }
            if !user.agent_onboarding_complete() && !self.is_agent_onboarding_path(req.path) {
                return Ok(GateDecision::Redirect(RedirectTarget::AgentOnboarding));
            }
        }

        Ok(GateDecision::Continue)
    }

    fn is_agent_onboarding_path(&self, path: &str) -> bool {
        let base = self.paths.agent_onboarding.trim_end_matches('/');
        path.strip_prefix(base)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("routes", &self.routes.rules().len())
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}
