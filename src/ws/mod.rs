//! WebSocket transport
//!
//! Provides the socket side of the realtime client: one connection at a
//! time, ping/pong keepalive, and lifecycle events on the driver channel.

mod transport;
mod types;

pub use transport::WsTransport;
pub use types::{WsConfig, WsError};
