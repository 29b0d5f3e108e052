//! Metrics emitted by the control loop, rendered through the `/metrics`
//! route in `server.rs`. Counter/histogram names use a `dealer_` prefix.

use std::time::Duration;

use anyhow::Context;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn record_tick_success(elapsed: Duration) {
    counter!("dealer_ticks_total", "outcome" => "success").increment(1);
    histogram!("dealer_tick_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_tick_failure(elapsed: Duration, error: &str) {
    counter!("dealer_ticks_total", "outcome" => "failure").increment(1);
    counter!("dealer_tick_errors_total", "error" => error.to_string()).increment(1);
    histogram!("dealer_tick_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_position_skipped() {
    counter!("dealer_position_phase_skipped_total").increment(1);
}

pub fn record_leverage_skipped() {
    counter!("dealer_leverage_phase_skipped_total").increment(1);
}

/// Installs the process-wide recorder and returns a handle that can render
/// the current snapshot as Prometheus text exposition.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let (recorder, _) = PrometheusBuilder::new()
        .build()
        .context("failed to build prometheus recorder")?;
    let handle = recorder.handle();
    metrics::set_boxed_recorder(Box::new(recorder))
        .map_err(|e| anyhow::anyhow!("failed to install global metrics recorder: {e}"))?;
    Ok(handle)
}
