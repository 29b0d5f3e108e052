//! Minimal outward-facing query surface: a liveness probe and a Prometheus
//! scrape endpoint. The control loop itself never depends on this surface
//! being reachable.

use axum::{response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
struct ServerState {
    prometheus: PrometheusHandle,
}

pub async fn serve(addr: &str, prometheus: PrometheusHandle) -> anyhow::Result<()> {
    let state = ServerState { prometheus };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr, "query surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics(
    axum::extract::State(state): axum::extract::State<ServerState>,
) -> impl IntoResponse {
    state.prometheus.render()
}
