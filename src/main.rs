//! Fleetgate - Workload Governance Controller
//!
//! The synchronous admission gate in front of a managed workload fleet:
//! every create, update or delete of a workload passes through the
//! governance pipeline here before it reaches the cluster.
//!
//! - Validation: env protection, secret and priority grants, autoscaling
//!   bounds, rollout-kind immutability, volume claim ownership
//! - Revisions: every accepted mutation becomes an immutable, hashed,
//!   phase-tracked history record with bounded retention

mod admission;
mod config;
mod defaults;
mod diff;
mod error;
mod governance;
mod keys;
mod models;
mod revision;
mod routes;
mod state;
mod store;
mod validate;

use crate::config::Settings;
use crate::governance::GovernanceRegistry;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Fleetgate - Workload Governance Controller...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    // Load the governance registry
    let governance = match &settings.governance_file {
        Some(path) => {
            let registry = GovernanceRegistry::from_file(path, &settings.operating_env)?;
            info!("📜 Governance config loaded from {}", path);
            registry
        }
        None => {
            warn!("⚠️  FLEETGATE_GOVERNANCE_FILE not set, running with an empty registry");
            GovernanceRegistry::empty(&settings.operating_env)
        }
    };

    let state = Arc::new(AppState::new(settings.clone(), Arc::new(governance)));

    // Build the router
    let app = create_router(state);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Admission ───");
    info!("   POST /admission/validate       - Validate a workload mutation");
    info!("");
    info!("   ─── Cluster Object Sync ───");
    info!("   POST /objects/secrets          - Register a secret");
    info!("   POST /objects/priorityClasses  - Register a priority class");
    info!("   POST /objects/claims           - Register a volume claim");
    info!("");
    info!("   ─── Revision History ───");
    info!("   GET  /workloads/{{ns}}/{{name}}/revisions - List a workload's history");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fleetgate=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
