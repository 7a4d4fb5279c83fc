use crate::room::RoomCommand;
use crate::signaling::{ConnectionId, SignalingService};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use chorus_core::ClientMessage;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_connection(connection_id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("WS IN {}: {:?}", connection_id, message);
                            let cmd = RoomCommand::Message {
                                connection_id,
                                message,
                            };
                            if let Err(e) = service.room_cmd_tx.send(cmd).await {
                                error!("Room manager died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {}", connection_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_connection(&connection_id);

    let _ = service
        .room_cmd_tx
        .send(RoomCommand::Disconnect { connection_id })
        .await;

    info!("WebSocket disconnected: {}", connection_id);
}
