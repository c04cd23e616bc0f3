//! End-to-end tests for the gate middleware.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`. Users
//! live in a `MemoryProvider`; sessions are HS256 tokens signed with a test
//! secret.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use hearth_core::entitlement::{EntitlementConfig, EntitlementResolver};
use hearth_core::gate::{Gate, RedirectPaths};
use hearth_core::identity::{Identity, Membership, Organization};
use hearth_core::memory::MemoryProvider;
use hearth_core::metadata::{self, Metadata};
use hearth_core::provider::IdentityProvider;
use hearth_core::route::RouteTable;
use hearth_server::config::SessionKey;
use hearth_server::routes::build_router;
use hearth_server::session::{SessionClaims, SessionVerifier};
use hearth_server::state::AppState;

const SECRET: &str = "integration-secret";
const PUBLIC_URL: &str = "https://hearth.example";

fn pages() -> Router<Arc<AppState>> {
    let page = |name: &'static str| get(move || async move { name });
    Router::new()
        .route("/", page("home"))
        .route("/properties/{id}", page("property"))
        .route("/dashboard", page("dashboard"))
        .route("/saved", page("saved"))
        .route("/onboarding", page("onboarding"))
        .route("/agent-onboarding", page("agent-onboarding"))
        .route("/about", page("about"))
        .route("/logo.svg", page("logo"))
}

fn app_with(provider: &MemoryProvider, entitlement: EntitlementConfig) -> Router {
    let provider: Arc<dyn IdentityProvider> = Arc::new(provider.clone());
    let gate = Gate::new(
        RouteTable::standard().unwrap(),
        RedirectPaths::default(),
        Arc::clone(&provider),
        EntitlementResolver::new(provider, entitlement),
    );
    let state = Arc::new(AppState {
        gate,
        sessions: Some(SessionVerifier::new(&SessionKey::Secret(SECRET.to_owned())).unwrap()),
        public_url: PUBLIC_URL.to_owned(),
    });
    build_router(state, pages())
}

fn app(provider: &MemoryProvider) -> Router {
    app_with(provider, EntitlementConfig::default())
}

fn session_token(user_id: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = SessionClaims {
        sub: user_id.to_owned(),
        sid: Some("sess_test".to_owned()),
        exp: now + 300,
        iat: Some(now),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn get_as(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(
            header::COOKIE,
            format!("__session={}", session_token(user_id)),
        );
    }
    builder.body(Body::empty()).unwrap()
}

fn location(resp: &axum::response::Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn onboarded() -> Metadata {
    Metadata::new().with(metadata::ONBOARDING_COMPLETE, true)
}

// ── anonymous ────────────────────────────────────────────────────────

#[tokio::test]
async fn public_page_served_without_session() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/properties/42", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "property");
}

#[tokio::test]
async fn protected_page_redirects_to_sign_in_with_original_url() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/dashboard?tab=leads", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        "/sign-in?redirect_url=https%3A%2F%2Fhearth.example%2Fdashboard%3Ftab%3Dleads"
    );
}

#[tokio::test]
async fn invalid_session_is_treated_as_anonymous() {
    let req = Request::builder()
        .uri("/saved")
        .header(header::AUTHORIZATION, "Bearer forged.token.value")
        .body(Body::empty())
        .unwrap();
    let resp = app(&MemoryProvider::new()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&resp).starts_with("/sign-in?redirect_url="));
}

#[tokio::test]
async fn unlisted_page_open_to_anonymous() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/about", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn static_asset_skips_gate() {
    // Signed-in user missing from the provider: a gated lookup would fail.
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/logo.svg", Some("user_ghost")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── onboarding ───────────────────────────────────────────────────────

#[tokio::test]
async fn new_user_sent_to_onboarding() {
    let provider = MemoryProvider::new();
    provider.put_user(Identity::new("user_new")).await;
    let resp = app(&provider)
        .oneshot(get_as("/saved", Some("user_new")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/onboarding");
}

#[tokio::test]
async fn onboarded_user_cannot_reenter_onboarding() {
    let provider = MemoryProvider::new();
    provider
        .put_user(Identity::new("user_1").with_public(onboarded()))
        .await;
    let resp = app(&provider)
        .oneshot(get_as("/onboarding", Some("user_1")))
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
}

// ── agent-restricted ─────────────────────────────────────────────────

#[tokio::test]
async fn unentitled_user_sent_to_pricing() {
    let provider = MemoryProvider::new();
    provider
        .put_user(Identity::new("user_1").with_public(onboarded()))
        .await;
    let resp = app(&provider)
        .oneshot(get_as("/dashboard", Some("user_1")))
        .await
        .unwrap();
    assert_eq!(location(&resp), "/pricing");
}

#[tokio::test]
async fn org_trial_reaches_agent_onboarding_without_loop() {
    let provider = MemoryProvider::new();
    provider
        .put_user(Identity::new("user_b").with_public(onboarded()))
        .await;
    provider
        .add_membership(
            "user_b",
            Membership::member_of(Organization {
                id: "org_o".to_owned(),
                slug: Some("open-door".to_owned()),
                public_metadata: Metadata::new().with(metadata::SUBSCRIPTION_STATUS, "trialing"),
            }),
        )
        .await;
    let app = app(&provider);

    let resp = app
        .clone()
        .oneshot(get_as("/dashboard", Some("user_b")))
        .await
        .unwrap();
    assert_eq!(location(&resp), "/agent-onboarding");

    let resp = app
        .oneshot(get_as("/agent-onboarding", Some("user_b")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "agent-onboarding");
}

#[tokio::test]
async fn bypass_lets_onboarded_agent_into_dashboard() {
    let provider = MemoryProvider::new();
    provider
        .put_user(Identity::new("user_dev").with_public(
            onboarded().with(metadata::AGENT_ONBOARDING_COMPLETE, true),
        ))
        .await;
    let app = app_with(
        &provider,
        EntitlementConfig {
            bypass: true,
            ..EntitlementConfig::default()
        },
    );
    let resp = app
        .oneshot(get_as("/dashboard", Some("user_dev")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "dashboard");
}

// ── failures ─────────────────────────────────────────────────────────

#[tokio::test]
async fn deleted_user_is_rejected_not_let_through() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/saved", Some("user_deleted")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "unauthorized");
}

#[tokio::test]
async fn unknown_path_is_json_404() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/nowhere", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "not_found");
}

// ── system & access routes ───────────────────────────────────────────

#[tokio::test]
async fn healthz_is_open_and_hardened() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/healthz", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn access_requires_session() {
    let resp = app(&MemoryProvider::new())
        .oneshot(get_as("/api/access", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_reports_verdict_and_flags() {
    let provider = MemoryProvider::new();
    provider
        .put_user(
            Identity::new("user_a").with_public(onboarded().with(metadata::PLAN, "pro")),
        )
        .await;
    let resp = app(&provider)
        .oneshot(get_as("/api/access", Some("user_a")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "user_id": "user_a",
            "entitled": true,
            "source": { "kind": "user_metadata" },
            "onboarding_complete": true,
            "agent_onboarding_complete": false
        })
    );
}
