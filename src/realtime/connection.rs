//! Connection lifecycle state machine
//!
//! ```text
//! disconnected --start/retry--> connecting --opened--> connected
//!      ^                            |                     |
//!      +----------closed------------+------closed---------+
//!                 error (transient) -> close -> closed
//! ```
//!
//! The machine is synchronous: it is fed [`DriverEvent`]s and reacts by
//! calling into its [`Transport`] and [`Backoff`]. Nothing here awaits.

use super::backoff::{Backoff, BackoffPolicy};
use super::dispatch::{self, Delivery};
use super::registry::{ControlSink, Listener, Registry};
use super::transport::{RetryTimer, Transport};
use super::types::{
    ClientError, ConnectionId, ConnectionStatus, ControlFrame, DriverEvent, SubscribeOptions,
    TransportEvent,
};
use crate::telemetry::{increment_counter, set_gauge, CounterMetric, GaugeMetric};
use tokio::sync::watch;

/// Control frames only leave while connected
struct Wire<'a> {
    transport: &'a mut dyn Transport,
    connected: bool,
}

impl ControlSink for Wire<'_> {
    fn send_control(&mut self, frame: &ControlFrame) -> Result<(), ClientError> {
        if !self.connected {
            return Err(ClientError::NotConnected);
        }
        self.transport.send(frame.encode())?;
        increment_counter(CounterMetric::ControlFramesSent);
        Ok(())
    }
}

/// Owns the transport, the backoff, and the subscription registry
pub struct Connection {
    transport: Box<dyn Transport>,
    backoff: Backoff,
    registry: Registry,
    status: watch::Sender<ConnectionStatus>,
    current: Option<ConnectionId>,
    next_id: u64,
    stopped: bool,
}

impl Connection {
    pub fn new(
        transport: Box<dyn Transport>,
        timer: Box<dyn RetryTimer>,
        policy: BackoffPolicy,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            transport,
            backoff: Backoff::new(policy, timer),
            registry: Registry::new(),
            status,
            current: None,
            next_id: 0,
            stopped: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn retry_attempts(&self) -> u32 {
        self.backoff.attempts()
    }

    pub fn retry_pending(&self) -> bool {
        self.backoff.is_pending()
    }

    /// Begin connecting. No-op while connecting/connected or after `stop()`.
    pub fn start(&mut self) {
        if self.stopped || self.current.is_some() {
            return;
        }
        self.backoff.cancel();
        self.open_transport();
    }

    /// Terminal teardown: cancel the retry, close the socket, forget all
    /// subscriptions without telling the server. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.backoff.cancel();
        if self.current.take().is_some() {
            self.transport.close();
        }
        let released = self.registry.clear();
        self.set_status(ConnectionStatus::Disconnected);
        tracing::info!(released, "Realtime connection stopped");
    }

    /// Send a raw text frame. Fails with `NotConnected` unless connected.
    pub fn send(&mut self, text: String) -> Result<(), ClientError> {
        if self.status() != ConnectionStatus::Connected {
            return Err(ClientError::NotConnected);
        }
        self.transport.send(text)
    }

    /// Register a listener; see [`Registry::subscribe`]
    pub fn subscribe(
        &mut self,
        event_type: &str,
        listener: Listener,
        options: SubscribeOptions,
    ) -> bool {
        if self.stopped {
            return false;
        }
        let mut wire = Wire {
            transport: self.transport.as_mut(),
            connected: *self.status.borrow() == ConnectionStatus::Connected,
        };
        self.registry.subscribe(event_type, listener, options, &mut wire)
    }

    /// Remove a listener; see [`Registry::unsubscribe`]
    pub fn unsubscribe(
        &mut self,
        event_type: &str,
        listener: &Listener,
        options: SubscribeOptions,
    ) -> bool {
        let mut wire = Wire {
            transport: self.transport.as_mut(),
            connected: *self.status.borrow() == ConnectionStatus::Connected,
        };
        self.registry
            .unsubscribe(event_type, listener, options, &mut wire)
    }

    /// Apply one event. Returns the delivery to run (outside any lock) for
    /// inbound frames that have listeners.
    pub fn handle(&mut self, event: DriverEvent) -> Option<Delivery> {
        if self.stopped {
            tracing::trace!(?event, "Ignoring event after stop");
            return None;
        }

        match event {
            DriverEvent::RetryFired { ticket } => {
                if self.backoff.fire(ticket) && self.current.is_none() {
                    tracing::info!(attempt = self.backoff.attempts(), "Retrying connection");
                    self.open_transport();
                } else {
                    tracing::trace!(ticket, "Ignoring stale retry timer");
                }
                None
            }
            DriverEvent::Transport { id, event } => {
                if self.current != Some(id) {
                    tracing::trace!(connection = %id, ?event, "Ignoring event from stale transport");
                    return None;
                }
                self.on_transport_event(id, event)
            }
        }
    }

    fn on_transport_event(&mut self, id: ConnectionId, event: TransportEvent) -> Option<Delivery> {
        match event {
            TransportEvent::Opened => {
                self.backoff.reset();
                self.set_status(ConnectionStatus::Connected);
                let mut wire = Wire {
                    transport: self.transport.as_mut(),
                    connected: true,
                };
                let replayed = self.registry.replay(&mut wire);
                tracing::info!(connection = %id, replayed, "Realtime connection established");
                None
            }
            TransportEvent::Message(text) => dispatch::route(&text, &self.registry),
            TransportEvent::Error(reason) => {
                let err = ClientError::Transport(reason);
                tracing::warn!(connection = %id, error = %err, "Transport error, closing");
                self.set_status(ConnectionStatus::Error);
                self.transport.close();
                None
            }
            TransportEvent::Closed => {
                self.current = None;
                self.registry.mark_all_inactive();
                self.set_status(ConnectionStatus::Disconnected);
                let delay = self.backoff.schedule();
                increment_counter(CounterMetric::Reconnects);
                tracing::info!(
                    connection = %id,
                    attempt = self.backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "Realtime connection closed, retry scheduled"
                );
                None
            }
        }
    }

    fn open_transport(&mut self) {
        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.current = Some(id);
        self.set_status(ConnectionStatus::Connecting);
        tracing::debug!(connection = %id, "Opening transport");
        self.transport.open(id);
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::debug!(from = %previous, to = %status, "Connection status changed");
            set_gauge(GaugeMetric::ConnectionStatus, status.gauge_value());
        }
    }
}
