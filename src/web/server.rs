use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::types::Config;

use super::api::{health_check, trigger_aggregation, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/aggregate", get(trigger_aggregation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the trigger service on `config.server.listen`.
pub async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let listen = config.server.listen.clone();
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(&listen).await?;
    tracing::info!("Trigger service listening on {}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Trigger service shutting down gracefully");
        })
        .await?;

    Ok(())
}
