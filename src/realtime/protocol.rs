//! Realtime frame formats
//!
//! Heartbeats and acknowledgments are answered here, at the transport edge.
//! Neither is required for a push to count as delivered.

use crate::core::types::ActionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OPEN_ACTION: &str = "open_action";

/// Wall-clock timestamp in the format every frame carries
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Frames pushed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connection {
        status: String,
        user_id: String,
        message: String,
    },
    Pong {
        timestamp: Value,
    },
    OpenAction {
        /// Full path of the leaf being opened
        menu: String,
        user_id: String,
        timestamp: String,
        data: ActionPayload,
    },
}

/// Navigation target carried inside an `open_action` push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "actionId")]
    pub action_id: ActionId,
    pub timestamp: String,
}

impl ServerMessage {
    pub fn connected(user_id: &str) -> Self {
        ServerMessage::Connection {
            status: "connected".to_string(),
            user_id: user_id.to_string(),
            message: "WebSocket connection established".to_string(),
        }
    }

    pub fn open_action(full_path: &str, user_id: &str, action_id: ActionId, timestamp: &str) -> Self {
        ServerMessage::OpenAction {
            menu: full_path.to_string(),
            user_id: user_id.to_string(),
            timestamp: timestamp.to_string(),
            data: ActionPayload {
                kind: OPEN_ACTION.to_string(),
                action_id,
                timestamp: timestamp.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames received from the client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping {
        #[serde(default)]
        timestamp: Value,
    },
    Ack {
        #[serde(default)]
        menu: Value,
    },
}

/// Answer a client text frame; `None` when nothing is sent back
pub fn handle_client_frame(user_id: &str, text: &str) -> Option<ServerMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping { timestamp }) => Some(ServerMessage::Pong { timestamp }),
        Ok(ClientMessage::Ack { menu }) => {
            tracing::info!(user_id, menu = %menu, "Client acknowledged navigation");
            None
        }
        Err(_) => {
            tracing::trace!(user_id, "Ignoring unrecognized frame");
            None
        }
    }
}
