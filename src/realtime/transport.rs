//! Seams between the state machine and the outside world
//!
//! Both traits are non-blocking: outcomes come back later as
//! [`DriverEvent`](super::DriverEvent)s on the driver channel.

use super::types::{ClientError, ConnectionId};
use std::time::Duration;

/// Owner of the physical duplex connection
pub trait Transport: Send {
    /// Start opening a new socket. Any previous socket must be closed first;
    /// open/message/error/close are reported tagged with `id`.
    fn open(&mut self, id: ConnectionId);

    /// Queue a text frame on the live socket
    fn send(&mut self, text: String) -> Result<(), ClientError>;

    /// Close the live socket, if any. A `Closed` event follows.
    fn close(&mut self);
}

/// Single-shot timer used by the backoff scheduler
pub trait RetryTimer: Send {
    /// Fire `RetryFired { ticket }` after `delay`, replacing any pending timer
    fn arm(&mut self, delay: Duration, ticket: u64);

    /// Drop the pending timer, if any
    fn cancel(&mut self);
}
