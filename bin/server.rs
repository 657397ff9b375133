// Water Store Dashboard - Web Server
// Serves the dashboard views as JSON; persists maintenance tickets on Ctrl+C

use anyhow::{Context, Result};
use std::path::PathBuf;
use store_dashboard::api::{router, AppState};
use store_dashboard::{logging, Dashboard, DashboardConfig};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref())?;

    let dashboard = Dashboard::load(&config).context("Cannot start dashboard: input data unavailable")?;
    let state = AppState::new(dashboard);
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    tracing::info!("Server running on http://{}", config.server.bind);
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down, saving maintenance tickets");
    state.lock().shutdown()?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
