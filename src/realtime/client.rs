//! Client facade: one multiplexed realtime connection per application session

use super::backoff::BackoffPolicy;
use super::connection::Connection;
use super::registry::Listener;
use super::timer::TokioRetryTimer;
use super::transport::{RetryTimer, Transport};
use super::types::{ClientError, ConnectionStatus, DriverEvent, Event, SubscribeOptions};
use crate::ws::{WsConfig, WsTransport};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Realtime event client
///
/// Construction starts connecting; dropping (or [`shutdown`](Self::shutdown))
/// stops it for good. All transport and timer events are applied by a single
/// driver task, and listeners run on that task in registration order.
///
/// # Example
///
/// ```ignore
/// let client = RealtimeClient::connect(WsConfig::new("ws://localhost:8081/ws"), BackoffPolicy::default());
///
/// let _chunks = client.subscribe_fn(LOG_CHUNK, SubscribeOptions::token("abc"), |event| {
///     println!("{:?}", event.payload());
///     Ok(())
/// });
/// ```
pub struct RealtimeClient {
    core: Arc<Mutex<Connection>>,
    status: watch::Receiver<ConnectionStatus>,
    driver: JoinHandle<()>,
}

impl RealtimeClient {
    /// Connect over WebSocket. Must be called within a Tokio runtime.
    pub fn connect(ws: WsConfig, policy: BackoffPolicy) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = WsTransport::new(ws, events_tx.clone());
        let timer = TokioRetryTimer::new(events_tx);
        Self::from_parts(Box::new(transport), Box::new(timer), policy, events_rx)
    }

    /// Assemble a client from its seams. `events` must receive everything
    /// `transport` and `timer` report.
    pub fn from_parts(
        transport: Box<dyn Transport>,
        timer: Box<dyn RetryTimer>,
        policy: BackoffPolicy,
        events: mpsc::UnboundedReceiver<DriverEvent>,
    ) -> Self {
        let mut connection = Connection::new(transport, timer, policy);
        let status = connection.watch_status();
        connection.start();

        let core = Arc::new(Mutex::new(connection));
        let driver = tokio::spawn(drive(core.clone(), events));

        Self {
            core,
            status,
            driver,
        }
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Register `listener` for `event_type`
    ///
    /// The first listener for a type subscribes on the wire (now if connected,
    /// otherwise on the next connect). Registering the same listener twice is
    /// a no-op; any of its guards then removes it.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        listener: Listener,
        options: SubscribeOptions,
    ) -> Subscription {
        let event_type = event_type.into();
        self.core
            .lock()
            .subscribe(&event_type, listener.clone(), options.clone());

        Subscription {
            core: Arc::downgrade(&self.core),
            event_type,
            listener,
            options,
            active: true,
        }
    }

    /// Register a closure; see [`subscribe`](Self::subscribe)
    pub fn subscribe_fn<F>(
        &self,
        event_type: impl Into<String>,
        options: SubscribeOptions,
        f: F,
    ) -> Subscription
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(event_type, Listener::new(f), options)
    }

    /// Remove `listener`. Returns false if it was not registered.
    pub fn unsubscribe(
        &self,
        event_type: &str,
        listener: &Listener,
        options: SubscribeOptions,
    ) -> bool {
        self.core.lock().unsubscribe(event_type, listener, options)
    }

    /// Send a raw text frame; fails with `NotConnected` unless connected
    pub fn send(&self, frame: impl Into<String>) -> Result<(), ClientError> {
        self.core.lock().send(frame.into())
    }

    /// Number of event types with at least one listener
    pub fn subscription_count(&self) -> usize {
        self.core.lock().registry().len()
    }

    /// Stop reconnecting, close the socket, release all subscriptions
    /// without unsubscribing on the wire. Idempotent.
    pub fn shutdown(&self) {
        self.core.lock().stop();
        self.driver.abort();
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("status", &self.status())
            .finish()
    }
}

/// Guard returned by [`RealtimeClient::subscribe`]
///
/// Cancelling or dropping it unsubscribes the listener. Once the client is
/// gone this does nothing.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    core: Weak<Mutex<Connection>>,
    event_type: String,
    listener: Listener,
    options: SubscribeOptions,
    active: bool,
}

impl Subscription {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Unsubscribe now
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::take(&mut self.active) {
            return;
        }
        if let Some(core) = self.core.upgrade() {
            core.lock()
                .unsubscribe(&self.event_type, &self.listener, self.options.clone());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("options", &self.options)
            .field("active", &self.active)
            .finish()
    }
}

/// Apply driver events one at a time; run deliveries outside the lock
async fn drive(core: Arc<Mutex<Connection>>, mut events: mpsc::UnboundedReceiver<DriverEvent>) {
    while let Some(event) = events.recv().await {
        let delivery = core.lock().handle(event);
        if let Some(delivery) = delivery {
            let report = delivery.run();
            tracing::trace!(
                delivered = report.delivered,
                failed = report.failed,
                "Frame dispatched"
            );
        }
    }
    tracing::debug!("Realtime driver stopped");
}
