//! Access status for the signed-in user.
//!
//! Lets the frontend decide what to render (agent navigation, upgrade
//! prompts) with the same verdict the gate uses.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;

use hearth_core::entitlement::EntitlementSource;

use crate::error::AppError;
use crate::session::SessionUser;
use crate::state::AppState;

/// Response for the access endpoint.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub user_id: String,
    pub entitled: bool,
    pub source: EntitlementSource,
    pub onboarding_complete: bool,
    pub agent_onboarding_complete: bool,
}

/// Build the access router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/access", get(access))
}

/// `GET /api/access`: entitlement and onboarding state of the current user.
async fn access(
    State(state): State<Arc<AppState>>,
    session: Option<Extension<SessionUser>>,
) -> Result<Json<AccessResponse>, AppError> {
    let Some(Extension(session)) = session else {
        return Err(AppError::Unauthorized("sign in required".to_owned()));
    };

    let user = state.gate.provider().get_user(&session.user_id).await?;
    let verdict = state.gate.resolver().resolve(&user).await;

    Ok(Json(AccessResponse {
        onboarding_complete: user.onboarding_complete(),
        agent_onboarding_complete: user.agent_onboarding_complete(),
        user_id: user.id,
        entitled: verdict.entitled,
        source: verdict.source,
    }))
}
