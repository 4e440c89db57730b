use std::time::Duration;

use {
    axum::{
        Router,
        extract::State,
        http::{StatusCode, header},
        response::{IntoResponse, Json, Response},
        routing::get,
    },
    tokio::net::TcpListener,
    tokio_util::sync::CancellationToken,
    tower_http::{timeout::TimeoutLayer, trace::TraceLayer},
    tracing::info,
};

use yuta_metrics::MetricsHandle;

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct AppState {
    /// `None` when metrics are disabled or the exporter is not compiled in.
    pub metrics_handle: Option<MetricsHandle>,
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the HTTP router (shared between production startup and tests).
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .route("/api/health", get(health_handler))
        .route("/metrics", get(prometheus_metrics_handler));

    #[cfg(feature = "metrics")]
    let router = router.layer(axum::middleware::from_fn(
        crate::metrics_middleware::http_metrics_middleware,
    ));

    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    info!("http server stopped");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Prometheus text exposition, unauthenticated so scrapers can reach it.
async fn prometheus_metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics_handle.as_ref() {
        Some(handle) => (
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not enabled",
        )
            .into_response(),
    }
}
