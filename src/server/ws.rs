//! WebSocket endpoint feeding the connection registry

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::core::error::{MenuError, Result};
use crate::realtime::{handle_client_frame, Connection, ServerMessage};
use crate::server::AppState;
use async_trait::async_trait;

/// How long a push may wait for the socket write to complete
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// A serialized frame and the channel its write result is reported on
pub struct Outbound {
    text: String,
    written: oneshot::Sender<bool>,
}

/// Registry handle for one socket.
///
/// Frames go through the socket's writer task; `send` completes only once
/// the writer reports the frame written to the transport.
pub struct ChannelConnection {
    id: String,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelConnection {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tx,
        }
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, message: &ServerMessage) -> Result<()> {
        let text = message.to_json()?;
        let (written, outcome) = oneshot::channel();
        self.tx
            .send(Outbound { text, written })
            .map_err(|_| MenuError::Delivery(format!("connection {} closed", self.id)))?;

        match tokio::time::timeout(SEND_TIMEOUT, outcome).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(MenuError::Delivery(format!(
                "write to connection {} failed",
                self.id
            ))),
            Ok(Err(_)) => Err(MenuError::Delivery(format!(
                "connection {} closed before the frame was written",
                self.id
            ))),
            Err(_) => Err(MenuError::Delivery(format!(
                "write to connection {} timed out",
                self.id
            ))),
        }
    }
}

/// Drain queued frames into `sink`, reporting each write; stops at the
/// first transport failure
pub async fn write_frames<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<Outbound>)
where
    S: Sink<Message> + Unpin,
{
    while let Some(frame) = rx.recv().await {
        let ok = sink.send(Message::Text(frame.text.into())).await.is_ok();
        let _ = frame.written.send(ok);
        if !ok {
            break;
        }
    }
}

#[derive(Serialize)]
pub struct ConnectionStatus {
    pub user_id: String,
    pub connected: bool,
}

pub(crate) async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, user_id, socket))
}

async fn handle_socket(state: Arc<AppState>, user_id: String, socket: WebSocket) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Outbound>();

    let connection = Arc::new(ChannelConnection::new(tx));
    let connection_id = connection.id().to_string();
    let registry = state.orchestrator.registry().clone();
    registry.register(&user_id, connection.clone()).await;

    // Written directly: the writer task is not running yet
    let hello = match ServerMessage::connected(&user_id).to_json() {
        Ok(text) => ws_sink.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "Failed to encode connection frame");
            false
        }
    };
    if !hello {
        registry.unregister_if_current(&user_id, &connection_id).await;
        tracing::warn!(user_id = %user_id, "Connection closed before acknowledgment");
        return;
    }

    let write_task = write_frames(ws_sink, rx);

    let reader = connection.clone();
    let reader_user = user_id.clone();
    let read_task = async move {
        while let Some(Ok(msg)) = ws_stream.next().await {
            match msg {
                Message::Text(text) => {
                    if let Some(reply) = handle_client_frame(&reader_user, &text) {
                        if reader.send(&reply).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = write_task => {},
        _ = read_task => {},
    }

    registry.unregister_if_current(&user_id, &connection_id).await;
    tracing::info!(user_id = %user_id, connection_id = %connection_id, "WebSocket closed");
}

pub(crate) async fn status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<ConnectionStatus> {
    let connected = state.orchestrator.registry().is_connected(&user_id).await;
    Json(ConnectionStatus { user_id, connected })
}
