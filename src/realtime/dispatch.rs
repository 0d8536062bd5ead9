//! Inbound frame fan-out
//!
//! Routing happens under the client lock and only snapshots listeners;
//! the snapshot is invoked afterwards so listeners may re-enter the client.

use super::registry::{Listener, Registry};
use super::types::{ClientError, Event};
use crate::telemetry::{increment_counter, CounterMetric};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of delivering one frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// One frame paired with the listeners registered for it when it arrived
#[derive(Debug)]
pub struct Delivery {
    event: Event,
    listeners: Vec<Listener>,
}

impl Delivery {
    pub fn new(event: Event, listeners: Vec<Listener>) -> Self {
        Self { event, listeners }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Invoke every listener in order. Failures are reported and never stop the loop.
    pub fn run(self) -> DispatchReport {
        let mut report = DispatchReport::default();

        for listener in &self.listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.call(&self.event)));
            let reason = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };

            report.failed += 1;
            let err = ClientError::CallbackFailure {
                event_type: self.event.event_type().to_string(),
                reason,
            };
            tracing::warn!(error = %err, "Listener failed during dispatch");
            increment_counter(CounterMetric::CallbackFailures);
        }

        increment_counter(CounterMetric::FramesDispatched);
        report
    }
}

/// Parse a text frame and pick its listeners. Malformed frames and frames
/// nobody listens to yield `None`.
pub fn route(text: &str, registry: &Registry) -> Option<Delivery> {
    let event = match Event::parse(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(
                error = %e,
                preview = %text.chars().take(100).collect::<String>(),
                "Discarding malformed frame"
            );
            increment_counter(CounterMetric::FramesMalformed);
            return None;
        }
    };

    match registry.listeners(event.event_type()) {
        Some(listeners) if !listeners.is_empty() => Some(Delivery::new(event, listeners)),
        _ => {
            tracing::trace!(event_type = event.event_type(), "No listeners for frame");
            None
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
