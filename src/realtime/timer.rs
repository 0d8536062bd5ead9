//! Retry timer backed by the Tokio clock

use super::transport::RetryTimer;
use super::types::DriverEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sleeps on a spawned task, then posts `RetryFired` to the driver channel
pub struct TokioRetryTimer {
    events: mpsc::UnboundedSender<DriverEvent>,
    pending: Option<JoinHandle<()>>,
}

impl TokioRetryTimer {
    pub fn new(events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self {
            events,
            pending: None,
        }
    }
}

impl RetryTimer for TokioRetryTimer {
    fn arm(&mut self, delay: Duration, ticket: u64) {
        self.cancel();
        let events = self.events.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(DriverEvent::RetryFired { ticket });
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioRetryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
