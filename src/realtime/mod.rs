//! Realtime event client
//!
//! One long-lived, self-healing connection multiplexing reference-counted
//! subscriptions, with inbound frames fanned out to listeners by event type.

mod backoff;
mod client;
mod connection;
mod dispatch;
mod registry;
#[cfg(test)]
mod testing;
mod timer;
mod transport;
mod types;

pub use backoff::{Backoff, BackoffPolicy};
pub use client::{RealtimeClient, Subscription};
pub use connection::Connection;
pub use dispatch::{route, Delivery, DispatchReport};
pub use registry::{ControlSink, Listener, Registry};
pub use timer::TokioRetryTimer;
pub use transport::{RetryTimer, Transport};
pub use types::{
    ClientError, ConnectionId, ConnectionStatus, ControlAction, ControlFrame, DriverEvent, Event,
    SubscribeOptions, TransportEvent, ALL_TOKENS, LOG_CHUNK, NEW_LOG,
};
