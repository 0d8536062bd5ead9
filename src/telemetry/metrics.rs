//! Prometheus metrics

use std::net::SocketAddr;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Retries scheduled after a closed connection
    Reconnects,
    /// Inbound frames delivered to at least one listener
    FramesDispatched,
    /// Inbound frames discarded as unparseable
    FramesMalformed,
    /// Listener errors or panics during dispatch
    CallbackFailures,
    /// Subscribe/unsubscribe frames written
    ControlFramesSent,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::Reconnects => "logwatch_reconnects_total",
            CounterMetric::FramesDispatched => "logwatch_frames_dispatched_total",
            CounterMetric::FramesMalformed => "logwatch_frames_malformed_total",
            CounterMetric::CallbackFailures => "logwatch_callback_failures_total",
            CounterMetric::ControlFramesSent => "logwatch_control_frames_sent_total",
        }
    }
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Current connection status (-1 error, 0 disconnected, 1 connecting, 2 connected)
    ConnectionStatus,
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::ConnectionStatus => "logwatch_connection_status",
        }
    }
}

/// Increment a counter by one
pub fn increment_counter(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Serve the Prometheus scrape endpoint on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        let counters = [
            CounterMetric::Reconnects,
            CounterMetric::FramesDispatched,
            CounterMetric::FramesMalformed,
            CounterMetric::CallbackFailures,
            CounterMetric::ControlFramesSent,
        ];
        for metric in counters {
            assert!(metric.name().starts_with("logwatch_"));
            assert!(metric.name().ends_with("_total"));
        }
        assert_eq!(
            GaugeMetric::ConnectionStatus.name(),
            "logwatch_connection_status"
        );
    }

    #[test]
    fn test_recording_without_exporter_is_harmless() {
        increment_counter(CounterMetric::Reconnects);
        set_gauge(GaugeMetric::ConnectionStatus, 2.0);
    }
}
