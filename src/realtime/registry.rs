//! Reference-counted subscriptions keyed by event type
//!
//! Only the first listener for a key puts a subscribe frame on the wire and
//! only the last one leaving takes it off again. Entries remember the options
//! of their wire subscription so they can be replayed after a reconnect.

use super::types::{ClientError, ControlFrame, Event, SubscribeOptions};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type ListenerFn = dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync;

/// A consumer callback. Identity is the allocation, so clones are the same listener.
#[derive(Clone)]
pub struct Listener(Arc<ListenerFn>);

impl Listener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn same_as(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    pub fn call(&self, event: &Event) -> anyhow::Result<()> {
        (self.0)(event)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Where the registry puts its control frames
pub trait ControlSink {
    fn send_control(&mut self, frame: &ControlFrame) -> Result<(), ClientError>;
}

struct Entry {
    listeners: Vec<Listener>,
    active_on_wire: bool,
    options: SubscribeOptions,
}

/// All subscription entries of one client
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event_type`. Returns false if it was already registered.
    ///
    /// On the 0→1 transition a subscribe frame goes to `sink`; if the sink
    /// refuses (not connected), the entry stays inactive until [`replay`](Self::replay).
    pub fn subscribe(
        &mut self,
        event_type: &str,
        listener: Listener,
        options: SubscribeOptions,
        sink: &mut dyn ControlSink,
    ) -> bool {
        let entry = self
            .entries
            .entry(event_type.to_string())
            .or_insert_with(|| Entry {
                listeners: Vec::new(),
                active_on_wire: false,
                options: options.clone(),
            });

        if entry.listeners.iter().any(|l| l.same_as(&listener)) {
            tracing::trace!(event_type, "Listener already registered");
            return false;
        }

        entry.listeners.push(listener);
        if entry.listeners.len() > 1 || entry.active_on_wire {
            tracing::debug!(
                event_type,
                listeners = entry.listeners.len(),
                "Added listener to existing subscription"
            );
            return true;
        }

        entry.options = options;
        let frame = ControlFrame::subscribe(event_type, entry.options.clone());
        match sink.send_control(&frame) {
            Ok(()) => {
                entry.active_on_wire = true;
                tracing::info!(event_type, "Subscribed on wire");
            }
            Err(ClientError::NotConnected) => {
                tracing::debug!(event_type, "Not connected, subscription deferred");
            }
            Err(e) => {
                tracing::warn!(event_type, error = %e, "Subscribe frame failed, deferred");
            }
        }
        true
    }

    /// Remove `listener`. Returns false if it was not registered.
    ///
    /// On the N→0 transition the entry is dropped, and an unsubscribe frame
    /// is sent if the server currently holds the subscription.
    pub fn unsubscribe(
        &mut self,
        event_type: &str,
        listener: &Listener,
        options: SubscribeOptions,
        sink: &mut dyn ControlSink,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(event_type) else {
            return false;
        };
        let Some(index) = entry.listeners.iter().position(|l| l.same_as(listener)) else {
            return false;
        };
        entry.listeners.remove(index);

        if !entry.listeners.is_empty() {
            tracing::debug!(
                event_type,
                listeners = entry.listeners.len(),
                "Removed listener, subscription kept"
            );
            return true;
        }

        let was_active = entry.active_on_wire;
        self.entries.remove(event_type);

        if was_active {
            let frame = ControlFrame::unsubscribe(event_type, options);
            match sink.send_control(&frame) {
                Ok(()) => tracing::info!(event_type, "Unsubscribed on wire"),
                Err(e) => tracing::debug!(event_type, error = %e, "Unsubscribe frame not sent"),
            }
        }
        true
    }

    /// Send a subscribe frame for every entry with listeners, using its stored options.
    /// Returns the number of frames sent.
    pub fn replay(&mut self, sink: &mut dyn ControlSink) -> usize {
        let mut sent = 0;
        for (event_type, entry) in self.entries.iter_mut() {
            if entry.listeners.is_empty() {
                continue;
            }
            let frame = ControlFrame::subscribe(event_type.as_str(), entry.options.clone());
            match sink.send_control(&frame) {
                Ok(()) => {
                    entry.active_on_wire = true;
                    sent += 1;
                }
                Err(e) => {
                    entry.active_on_wire = false;
                    tracing::warn!(event_type = %event_type, error = %e, "Replay failed");
                }
            }
        }
        sent
    }

    /// The server forgot everything: nothing is active on the wire any more
    pub fn mark_all_inactive(&mut self) {
        for entry in self.entries.values_mut() {
            entry.active_on_wire = false;
        }
    }

    /// Drop every entry without touching the wire. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Snapshot of the listeners for one event type, in registration order
    pub fn listeners(&self, event_type: &str) -> Option<Vec<Listener>> {
        self.entries
            .get(event_type)
            .map(|entry| entry.listeners.clone())
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.entries
            .get(event_type)
            .map_or(0, |entry| entry.listeners.len())
    }

    pub fn is_active(&self, event_type: &str) -> bool {
        self.entries
            .get(event_type)
            .is_some_and(|entry| entry.active_on_wire)
    }

    pub fn options(&self, event_type: &str) -> Option<&SubscribeOptions> {
        self.entries.get(event_type).map(|entry| &entry.options)
    }

    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
