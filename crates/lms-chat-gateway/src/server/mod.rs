//! Hub server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod routes;
mod state;

pub use handler::{hub_handler, resolve_identity, HubQuery};
pub use routes::{health_check, presence, HttpError};
pub use state::GatewayState;

use axum::{routing::get, Router};
use lms_chat_common::{AppConfig, AppError};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the hub router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/hub", get(hub_handler))
        .route("/health", get(health_check))
        .route("/presence/:user_id", get(presence))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the shared hub state
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    GatewayState::new(config)
}

/// Serve the application on an already bound listener until ctrl-c
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), AppError> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::Server(format!("Failed to read local address: {e}")))?;

    tracing::info!("Hub listening on ws://{}/hub", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(format!("Server error: {e}")))
}

/// Run the complete hub server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.gateway.address();

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    let app = create_app(create_gateway_state(config));

    run_server(app, listener).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
