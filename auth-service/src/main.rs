use std::sync::Arc;

use anyhow::Context;
use auth_service::config::load_service_config;
use auth_service::{build_app, AppState};
use common_auth::JwtSettings;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_service_config()?;
    let settings = Arc::new(
        JwtSettings::initialize(&config.jwt).context("Failed to initialize JWT settings")?,
    );
    let state = AppState::with_default_verifier(settings)
        .context("Failed to build application state")?;
    let app = build_app(state);

    info!(addr = %config.listen_addr, "starting auth-service");
    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
