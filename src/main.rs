mod actors;
mod api;
mod app_system;
mod clients;
mod config;
mod domain;
mod error;
mod messages;
mod status;
mod store;
mod sweep;

#[cfg(test)]
mod integration_tests;

use std::sync::Arc;

use tracing::info;

use crate::api::{router::app_router, AppState};
use crate::app_system::{setup_tracing, DeliverySystem};
use crate::config::Config;
use crate::sweep::{RiderPool, Sweeper};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = Config::from_env();
    info!(?config, "Starting booking backend");

    let system = DeliverySystem::new();

    let pending_threshold = chrono::Duration::from_std(config.pending_assign_threshold)
        .map_err(|e| e.to_string())?;
    let sweeper = Sweeper::new(
        system.booking_client.clone(),
        Arc::new(RiderPool::default()),
        pending_threshold,
    );
    let sweep_handle = tokio::spawn(sweeper.run(config.sweep_interval));

    let state = AppState {
        bookings: system.booking_client.clone(),
        tracking: system.tracking_client.clone(),
        messages: system.message_client.clone(),
    };
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.bind_addr, e))?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| e.to_string())?;

    sweep_handle.abort();
    system.shutdown().await?;

    info!("Backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
