//! LMS chat hub entry point
//!
//! Run with:
//! ```bash
//! GATEWAY_PORT=5080 cargo run -p lms-chat-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`, if present).

use lms_chat_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        address = %config.gateway.address(),
        heartbeat_interval_ms = config.heartbeat.interval_ms,
        "Starting LMS chat hub"
    );

    if let Err(e) = lms_chat_gateway::run(config).await {
        error!(error = %e, "Hub failed");
        std::process::exit(1);
    }
}
