use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use eyre::WrapErr;
use hw_common::config::WebhookConfig;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use super::{
    handlers::{check_config, handle_webhook, logs_json, metrics, root},
    state::AppState,
};
use crate::infrastructure::MAX_REQUEST_SIZE;

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/check-config", get(check_config))
        .route("/logs.json", get(logs_json))
        .route("/metrics", get(metrics))
        .route("/webhook", post(handle_webhook))
        // The byte limit below replaces axum's 2 MiB default for `Bytes`
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_REQUEST_SIZE))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> eyre::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .wrap_err("Webhook server failed")
}

/// Start the webhook server
pub async fn start_webhook_server(
    config: WebhookConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> eyre::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::from_config(Arc::new(config)).await?;

    let listener =
        TcpListener::bind(addr).await.wrap_err_with(|| format!("Failed to bind {addr}"))?;
    info!("Webhook server listening on {}", addr);

    serve(listener, state, shutdown).await?;

    info!("Webhook server stopped");
    Ok(())
}
