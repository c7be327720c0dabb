//! Deployer service binary.
//!
//! Standalone HTTP service that receives task requests and reconciles
//! GitHub repositories with published Pages sites.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deployer::{server, Config, GitHubClient, Reconciler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("deployer=info".parse()?))
        .init();

    info!("Starting deployer service...");

    // Load configuration
    let config = Config::default();

    if config.github_token.is_none() {
        warn!("No GITHUB_TOKEN configured - task requests will be rejected");
    }
    if config.student_secret.is_none() {
        warn!("No STUDENT_SECRET configured - all requests will fail authentication");
    }

    // Build the GitHub client and reconciler
    let github = GitHubClient::new(config.github_token.as_deref().unwrap_or_default())
        .context("Failed to create GitHub client")?;
    let reconciler = Reconciler::new(config.clone(), github);

    // Build application state and router
    let state = server::AppState {
        config: config.clone(),
        reconciler,
    };
    let app = server::build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, owner = %config.owner, "Deployer service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
