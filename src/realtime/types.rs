//! Realtime client types: status, envelopes, and errors

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Event type announcing a freshly created log
pub const NEW_LOG: &str = "new_log";
/// Event type carrying appended text for one log
pub const LOG_CHUNK: &str = "log_chunk";
/// Token used to subscribe to every log at once
pub const ALL_TOKENS: &str = "*";

/// Connection status as seen by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No socket; a retry may be pending
    #[default]
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Socket open, frames flowing
    Connected,
    /// Transport faulted; a close always follows
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }

    /// Numeric value exported as the connection status gauge
    pub fn gauge_value(&self) -> f64 {
        match self {
            ConnectionStatus::Disconnected => 0.0,
            ConnectionStatus::Connecting => 1.0,
            ConnectionStatus::Connected => 2.0,
            ConnectionStatus::Error => -1.0,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra fields merged into subscribe/unsubscribe frames (e.g. `token`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscribeOptions(Map<String, Value>);

impl SubscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying only a log token
    pub fn token(token: impl Into<String>) -> Self {
        Self::new().with("token", token.into())
    }

    /// Add or replace a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Direction of a control frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Subscribe,
    Unsubscribe,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Subscribe => "subscribe",
            ControlAction::Unsubscribe => "unsubscribe",
        }
    }
}

/// Outbound `{"type": "subscribe"|"unsubscribe", "event": ..., ...options}` frame
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFrame {
    pub action: ControlAction,
    pub event: String,
    pub options: SubscribeOptions,
}

impl ControlFrame {
    pub fn subscribe(event: impl Into<String>, options: SubscribeOptions) -> Self {
        Self {
            action: ControlAction::Subscribe,
            event: event.into(),
            options,
        }
    }

    pub fn unsubscribe(event: impl Into<String>, options: SubscribeOptions) -> Self {
        Self {
            action: ControlAction::Unsubscribe,
            event: event.into(),
            options,
        }
    }

    /// Build the JSON object. `type` and `event` always win over option fields.
    pub fn to_value(&self) -> Value {
        let mut object = self.options.0.clone();
        object.insert("type".into(), Value::from(self.action.as_str()));
        object.insert("event".into(), Value::from(self.event.as_str()));
        Value::Object(object)
    }

    /// Encode as a text frame
    pub fn encode(&self) -> String {
        self.to_value().to_string()
    }
}

/// Parsed inbound frame: a required `type` discriminant plus opaque fields
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: String,
    fields: Map<String, Value>,
}

impl Event {
    /// Parse a text frame. Anything that is not a JSON object with a string
    /// `type` is a [`ClientError::MalformedFrame`].
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ClientError::MalformedFrame(e.to_string()))?;

        let Value::Object(fields) = value else {
            return Err(ClientError::MalformedFrame("frame is not an object".into()));
        };

        let event_type = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::MalformedFrame("missing string `type`".into()))?
            .to_string();

        Ok(Self { event_type, fields })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Raw field lookup, including `type`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// `token` field as broadcast by the log server
    pub fn token(&self) -> Option<&str> {
        self.fields.get("token").and_then(Value::as_str)
    }

    /// `payload` field as broadcast by the log server
    pub fn payload(&self) -> Option<&Value> {
        self.fields.get("payload")
    }

    /// Decode the whole frame into a typed shape
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Identifies one transport instance; events from older instances are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What a transport instance reports back
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

/// Everything the driver task feeds into the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Transport {
        id: ConnectionId,
        event: TransportEvent,
    },
    RetryFired {
        ticket: u64,
    },
}

/// Realtime client errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Send attempted while not connected
    #[error("not connected")]
    NotConnected,
    /// Underlying socket faulted
    #[error("transport error: {0}")]
    Transport(String),
    /// Inbound frame could not be parsed
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// A consumer callback failed during dispatch
    #[error("callback for '{event_type}' failed: {reason}")]
    CallbackFailure { event_type: String, reason: String },
}
