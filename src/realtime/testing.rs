//! In-memory transport and timer for driving the state machine in tests

use super::transport::{RetryTimer, Transport};
use super::types::{ClientError, ConnectionId};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct TransportLog {
    opened: Vec<ConnectionId>,
    sent: Vec<String>,
    closes: usize,
}

/// Records every call; never touches the network
#[derive(Clone, Default)]
pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn opened(&self) -> Vec<ConnectionId> {
        self.log.lock().opened.clone()
    }

    pub fn last_opened(&self) -> Option<ConnectionId> {
        self.log.lock().opened.last().copied()
    }

    pub fn closes(&self) -> usize {
        self.log.lock().closes
    }

    /// Sent frames parsed back to JSON, draining the log
    pub fn take_sent(&self) -> Vec<Value> {
        std::mem::take(&mut self.log.lock().sent)
            .iter()
            .map(|text| serde_json::from_str(text).expect("fake transport got invalid JSON"))
            .collect()
    }
}

impl Transport for FakeTransport {
    fn open(&mut self, id: ConnectionId) {
        self.log.lock().opened.push(id);
    }

    fn send(&mut self, text: String) -> Result<(), ClientError> {
        self.log.lock().sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.log.lock().closes += 1;
    }
}

#[derive(Default)]
struct TimerLog {
    armed: Vec<(Duration, u64)>,
    cancellations: usize,
}

/// Records armed delays; tests fire tickets by hand
#[derive(Clone, Default)]
pub struct FakeTimer {
    log: Arc<Mutex<TimerLog>>,
}

impl FakeTimer {
    pub fn armed(&self) -> Vec<(Duration, u64)> {
        self.log.lock().armed.clone()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.log.lock().armed.iter().map(|(d, _)| *d).collect()
    }

    pub fn last_ticket(&self) -> Option<u64> {
        self.log.lock().armed.last().map(|(_, t)| *t)
    }

    pub fn cancellations(&self) -> usize {
        self.log.lock().cancellations
    }
}

impl RetryTimer for FakeTimer {
    fn arm(&mut self, delay: Duration, ticket: u64) {
        self.log.lock().armed.push((delay, ticket));
    }

    fn cancel(&mut self) {
        self.log.lock().cancellations += 1;
    }
}
