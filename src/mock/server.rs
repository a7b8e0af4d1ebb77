use crate::mock::api::{query_devices, MockState};
use axum::{routing::post, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Router serving the telemetry query at `path`.
pub fn router(path: &str, state: Arc<MockState>) -> Router {
    Router::new()
        .route(path, post(query_devices))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the mock endpoint on an already bound listener.
pub async fn serve(listener: TcpListener, path: &str, state: Arc<MockState>) -> std::io::Result<()> {
    info!(
        addr = %listener.local_addr()?,
        path = %path,
        tolerance_ms = state.limiter.tolerance().as_millis() as u64,
        "Starting mock telemetry endpoint"
    );

    axum::serve(listener, router(path, state)).await
}

/// Bind `listen_addr` and serve the mock endpoint.
pub async fn start_server(listen_addr: &str, path: &str, state: Arc<MockState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    serve(listener, path, state).await
}
