//! Hearth server entry point.
//!
//! Loads configuration, wires the identity provider, entitlement resolver,
//! and request gate together, then starts the Axum HTTP server with
//! graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use hearth_core::entitlement::EntitlementResolver;
use hearth_core::gate::{Gate, RedirectPaths};
use hearth_core::memory::MemoryProvider;
use hearth_core::provider::IdentityProvider;
use hearth_core::route::RouteTable;

use hearth_server::clerk::ClerkClient;
use hearth_server::config::{Environment, LogFormat, ServerConfig};
use hearth_server::routes;
use hearth_server::session::SessionVerifier;
use hearth_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment.
    let config = ServerConfig::from_env();

    init_tracing(&config);

    info!(
        environment = ?config.environment,
        bypass = config.entitlement.bypass,
        "Hearth starting"
    );

    if config.bypass_refused {
        warn!("HEARTH_ENTITLEMENT_BYPASS ignored in production");
    } else if config.entitlement.bypass {
        warn!("entitlement bypass enabled: every signed-in user is treated as entitled");
    }

    let state = build_app_state(&config)?;
    let app = routes::build_router(state, Router::new());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Hearth server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Hearth server stopped");
    Ok(())
}

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init(),
    }
}

/// Build the shared application state.
fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let provider: Arc<dyn IdentityProvider> = if config.clerk.is_configured() {
        info!(api_url = %config.clerk.api_url, "using Clerk identity provider");
        Arc::new(ClerkClient::new(&config.clerk).context("failed to build Clerk client")?)
    } else if config.environment == Environment::Production {
        anyhow::bail!("CLERK_SECRET_KEY is required in production");
    } else {
        warn!("CLERK_SECRET_KEY not set, using an empty in-memory identity provider");
        Arc::new(MemoryProvider::new())
    };

    let sessions = match &config.session_key {
        Some(key) => Some(SessionVerifier::new(key).context("failed to load session key")?),
        None => {
            warn!("no CLERK_JWT_KEY or HEARTH_SESSION_SECRET, every request is anonymous");
            None
        }
    };

    let resolver = EntitlementResolver::new(Arc::clone(&provider), config.entitlement.clone());
    let routes = RouteTable::standard().context("invalid route table")?;
    let gate = Gate::new(routes, RedirectPaths::default(), provider, resolver);

    Ok(Arc::new(AppState {
        gate,
        sessions,
        public_url: config.public_url.clone(),
    }))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
