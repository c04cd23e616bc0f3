//! Request gate middleware.
//!
//! Runs [`Gate::decide`](hearth_core::gate::Gate::decide) for every gated
//! request. On `Continue` the signed-in user (if any) is injected into the
//! request extensions as a [`SessionUser`] for downstream handlers. On
//! `Redirect` the request never reaches a handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::info;

use hearth_core::gate::{GateDecision, GateRequest};
use hearth_core::route::is_gated_path;

use crate::error::AppError;
use crate::session::SessionUser;
use crate::state::AppState;

/// Middleware that applies the request gate.
///
/// Skips static assets and framework internals.
///
/// # Errors
///
/// Returns [`AppError`] if the identity provider lookup fails. Requests are
/// never let through on provider failure.
pub async fn gate_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_owned();

    if !is_gated_path(&path) {
        return Ok(next.run(req).await);
    }

    let session: Option<SessionUser> = state.session_user(req.headers());
    let url = state.original_url(req.uri());

    let decision = state
        .gate
        .decide(GateRequest {
            path: &path,
            url: &url,
            user_id: session.as_ref().map(|s| s.user_id.as_str()),
        })
        .await?;

    match decision {
        GateDecision::Continue => {
            if let Some(user) = session {
                req.extensions_mut().insert(user);
            }
            Ok(next.run(req).await)
        }
        GateDecision::Redirect(target) => {
            let location = target.location(state.gate.paths());
            info!(
                path = %path,
                user_id = session.as_ref().map(|s| s.user_id.as_str()),
                location = %location,
                "gate redirect"
            );
            Ok(Redirect::temporary(&location).into_response())
        }
    }
}
