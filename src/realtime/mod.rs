//! Realtime delivery to connected clients

pub mod protocol;
pub mod registry;

pub use protocol::{handle_client_frame, ClientMessage, ServerMessage};
pub use registry::{Connection, ConnectionRegistry};
