//! WebSocket transport handle backed by tokio-tungstenite
//!
//! Each `open` spawns one socket task. The task reports what happens to the
//! driver channel and always finishes with `Closed`: the reporter sends it
//! when dropped, so a clean close, a failure, a cancelled handshake and a
//! panic all end the same way.

use super::types::{non_zero, WsConfig, WsError};
use crate::realtime::{ClientError, ConnectionId, DriverEvent, Transport, TransportEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::{connect_async, tungstenite::Message};

struct LiveSocket {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<String>,
    _task: JoinHandle<()>,
}

/// Transport that keeps at most one WebSocket alive
pub struct WsTransport {
    config: WsConfig,
    events: mpsc::UnboundedSender<DriverEvent>,
    live: Option<LiveSocket>,
}

impl WsTransport {
    /// Create a transport that reports into `events`
    pub fn new(config: WsConfig, events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self {
            config,
            events,
            live: None,
        }
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Id of the socket currently owned, if any
    pub fn live_id(&self) -> Option<ConnectionId> {
        self.live.as_ref().map(|live| live.id)
    }
}

impl Transport for WsTransport {
    fn open(&mut self, id: ConnectionId) {
        self.close();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let reporter = Reporter {
            id,
            events: self.events.clone(),
        };
        let config = self.config.clone();
        let task = tokio::spawn(run_socket(config, reporter, outbound_rx));

        self.live = Some(LiveSocket {
            id,
            outbound: outbound_tx,
            _task: task,
        });
    }

    fn send(&mut self, text: String) -> Result<(), ClientError> {
        let live = self.live.as_ref().ok_or(ClientError::NotConnected)?;
        live.outbound
            .send(text)
            .map_err(|_| ClientError::NotConnected)
    }

    fn close(&mut self) {
        // Dropping the outbound sender tells the socket task to close, or to
        // abandon a handshake still in flight
        if let Some(live) = self.live.take() {
            tracing::debug!(connection = %live.id, "Closing WebSocket");
        }
    }
}

struct Reporter {
    id: ConnectionId,
    events: mpsc::UnboundedSender<DriverEvent>,
}

impl Reporter {
    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(DriverEvent::Transport { id: self.id, event });
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.emit(TransportEvent::Closed);
    }
}

async fn run_socket(
    config: WsConfig,
    reporter: Reporter,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    match connect_and_stream(&config, &reporter, &mut outbound).await {
        Ok(()) => {
            tracing::info!(connection = %reporter.id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            tracing::warn!(connection = %reporter.id, error = %e, "WebSocket connection failed");
            reporter.emit(TransportEvent::Error(e.to_string()));
        }
    }
}

/// Connect to WebSocket and stream messages until closed
async fn connect_and_stream(
    config: &WsConfig,
    reporter: &Reporter,
    outbound: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), WsError> {
    tracing::info!(url = %config.url, connection = %reporter.id, "Connecting to WebSocket");

    let connect_timeout = non_zero(config.connect_timeout);
    let handshake = tokio::time::timeout(connect_timeout, connect_async(config.url.as_str()));
    let (ws_stream, _response) = tokio::select! {
        biased;

        // Nothing is queued before `Opened`, so this only fires on close
        None = outbound.recv() => {
            tracing::debug!(connection = %reporter.id, "Handshake abandoned");
            return Ok(());
        }

        result = handshake => result
            .map_err(|_| WsError::ConnectTimeout(connect_timeout))?
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?,
    };

    let (mut write, mut read) = ws_stream.split();

    tracing::info!(connection = %reporter.id, "WebSocket connected");
    reporter.emit(TransportEvent::Opened);

    let pong_timeout = non_zero(config.pong_timeout);
    let mut ping_interval = tokio::time::interval(non_zero(config.ping_interval));
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick completes immediately
    ping_interval.tick().await;

    let mut pong_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        reporter.emit(TransportEvent::Message(text));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::trace!(len = data.len(), "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await
                            .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        pong_deadline = None;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Received close frame");
                        return Ok(());
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        return Err(WsError::ConnectionFailed(e.to_string()));
                    }
                    None => {
                        return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                    }
                }
            }

            msg = outbound.recv() => {
                match msg {
                    Some(text) => {
                        write.send(Message::Text(text)).await
                            .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    }
                    None => {
                        // Owner dropped the handle
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
            }

            _ = ping_interval.tick(), if pong_deadline.is_none() => {
                write.send(Message::Ping(Vec::new())).await
                    .map_err(|e| WsError::SendFailed(e.to_string()))?;
                pong_deadline = Some(Instant::now() + pong_timeout);
            }

            _ = async {
                match pong_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => {
                return Err(WsError::PongTimeout(pong_timeout));
            }
        }
    }
}
