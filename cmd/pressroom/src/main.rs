//! # Pressroom server
//!
//! Assembles the adapters selected at compile time and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use auth_adapters::JwtIdentityGate;
use configs::{LogSettings, Settings};
use services::{Repositories, ServiceOptions, Services};
use storage_adapters::SqliteStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    // 1. Storage
    let store = SqliteStore::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", settings.database.url))?;

    // 2. Services and identity gate share the same store
    let repos = Repositories::from_store(store);
    let gate = JwtIdentityGate::new(
        &settings.auth.jwt_secret,
        repos.users.clone(),
        settings.auth.token_ttl_secs,
    );
    let services = Services::new(
        repos,
        ServiceOptions {
            claps_enabled: settings.features.claps_enabled,
        },
    );

    // 3. HTTP
    let app = router(AppState::new(services, Arc::new(gate)));
    let addr = settings.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(%addr, claps_enabled = settings.features.claps_enabled, "pressroom listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;
    info!("pressroom stopped");
    Ok(())
}

/// `RUST_LOG` overrides the configured level.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
