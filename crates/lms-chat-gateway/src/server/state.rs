//! Gateway state
//!
//! Application state for the hub server.

use crate::connection::ConnectionManager;
use crate::hub::PresenceTracker;
use lms_chat_common::AppConfig;
use std::sync::Arc;

/// Hub application state
///
/// Holds all shared dependencies for the hub server.
#[derive(Clone)]
pub struct GatewayState {
    /// Presence and typing tracker
    tracker: Arc<PresenceTracker>,
    /// Connection manager for WebSocket connections
    connection_manager: Arc<ConnectionManager>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new state with an empty connection registry
    pub fn new(config: AppConfig) -> Self {
        let connection_manager = ConnectionManager::new_shared();
        let tracker = PresenceTracker::new_shared(connection_manager.clone());

        Self {
            tracker,
            connection_manager,
            config: Arc::new(config),
        }
    }

    /// Get the presence tracker
    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("tracker", &self.tracker)
            .field("connection_manager", &self.connection_manager)
            .field("config", &"AppConfig")
            .finish()
    }
}
