use crate::error::ClientError;
use crate::transport::{SignalingChannel, SignalingConnector};
use async_trait::async_trait;
use chorus_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Signaling over a WebSocket, one JSON text frame per message.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

fn decode_frame(text: &str) -> Result<ServerMessage, ClientError> {
    serde_json::from_str(text)
        .map_err(|e| ClientError::Protocol(format!("unrecognized frame ({}): {}", e, text)))
}

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(&self) -> Result<SignalingChannel, ClientError> {
        info!("Connecting to {}", self.url);

        let (stream, _) = tokio::time::timeout(
            CONNECT_TIMEOUT,
            tokio_tungstenite::connect_async(self.url.as_str()),
        )
        .await
        .map_err(|_| ClientError::Connection(format!("timed out after {:?}", CONNECT_TIMEOUT)))?
        .map_err(|e| ClientError::Connection(e.to_string()))?;

        let (mut ws_write, mut ws_read) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<ServerMessage>();

        // Writer: ends when the session drops its sender, then closes the socket.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {:?}: {}", message, e);
                        continue;
                    }
                };
                if ws_write.send(WsMessage::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_write.send(WsMessage::Close(None)).await;
        });

        // Reader: dropping `inbound_tx` is how the session learns the socket is gone.
        tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match decode_frame(&text) {
                        Ok(message) => {
                            if inbound_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("{}", e),
                    },
                    Ok(WsMessage::Close(_)) => {
                        info!("Server closed the signaling socket");
                        break;
                    }
                    Err(e) => {
                        warn!("Signaling socket error: {}", e);
                        break;
                    }
                    Ok(other) => debug!("Ignoring frame {:?}", other),
                }
            }
        });

        Ok(SignalingChannel { outbound, inbound })
    }
}
