use crate::config::ServerConfig;
use crate::room::{RoomCommand, RoomManager};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// `GET /ws` upgrades to a signaling socket; `GET /healthz` reports the live room count.
pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(service)
}

async fn healthz(State(service): State<SignalingService>) -> String {
    let rooms = service.snapshot().await.map(|r| r.len()).unwrap_or_default();
    format!("ok rooms={} sockets={}", rooms, service.connection_count())
}

/// Runs the signaling server until `shutdown` resolves, then tells every client to leave.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<RoomCommand>(config.command_buffer);
    let service = SignalingService::new(cmd_tx.clone());

    let manager = RoomManager::new(&config, cmd_rx, Arc::new(service.clone()));
    tokio::spawn(manager.run());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Signaling server listening on {}", config.bind_addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = cmd_tx
                .send(RoomCommand::DisconnectAll {
                    reason: "server shutting down".into(),
                })
                .await;
        })
        .await
        .context("Signaling server failed")?;

    Ok(())
}
