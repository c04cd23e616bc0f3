//! HTTP route handlers and router assembly.

pub mod access;
pub mod sys;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Uri};
use axum::middleware as axum_mw;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::gate_middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
///
/// `pages` carries the site's page handlers; they sit behind the gate like
/// every other route. Unmatched paths fall through to a JSON 404.
pub fn build_router(state: Arc<AppState>, pages: Router<Arc<AppState>>) -> Router {
    Router::new()
        .merge(sys::router())
        .merge(access::router())
        .merge(pages)
        .fallback(not_found)
        .layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
